//! Working out which configured database is which
//!
//! The two databases are addressed only by URI, and it is easy to swap them
//! in configuration. Inspecting labels and relationship types tells them
//! apart.

use super::cypher;
use super::neo4j::GraphConnection;
use super::traits::GraphResult;
use super::types::StoreRole;
use crate::config::StoreConfig;
use neo4rs::query;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How many labels get a sample node inspected.
const SAMPLED_LABELS: usize = 3;

/// What a database turned out to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// People, publications and organizations (db1)
    ResearchIntelligence,
    /// People and theses (db2)
    ThesisRelationships,
    Unknown,
}

impl StoreKind {
    /// `Thesis` wins over `Publication`/`Organization` when both are present.
    pub fn classify<S: AsRef<str>>(labels: &[S]) -> Self {
        let has = |wanted: &str| labels.iter().any(|l| l.as_ref() == wanted);
        if has("Thesis") {
            StoreKind::ThesisRelationships
        } else if has("Publication") || has("Organization") {
            StoreKind::ResearchIntelligence
        } else {
            StoreKind::Unknown
        }
    }

    pub fn role(&self) -> Option<StoreRole> {
        match self {
            StoreKind::ResearchIntelligence => Some(StoreRole::Research),
            StoreKind::ThesisRelationships => Some(StoreRole::Thesis),
            StoreKind::Unknown => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            StoreKind::ResearchIntelligence => {
                "research intelligence database (ORCID and institutional research data)"
            }
            StoreKind::ThesisRelationships => {
                "thesis relationships database (supervision and examination data)"
            }
            StoreKind::Unknown => "unable to identify database type",
        }
    }
}

/// Node count for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Property keys seen on one sample node of a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSample {
    pub label: String,
    pub properties: Vec<String>,
}

/// Schema-level summary of one database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInventory {
    pub uri: String,
    pub labels: Vec<String>,
    pub counts: Vec<LabelCount>,
    pub relationship_types: Vec<String>,
    pub samples: Vec<LabelSample>,
    pub kind: StoreKind,
}

impl StoreInventory {
    /// Whether the contents fit the role the database is configured for.
    pub fn matches_role(&self, role: StoreRole) -> bool {
        self.kind.role() == Some(role)
    }
}

/// Outcome of identifying one configured store. A failure is carried as
/// text so one unreachable store does not hide the other's report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyOutcome {
    pub configured_as: StoreRole,
    pub uri: String,
    pub inventory: Option<StoreInventory>,
    pub error: Option<String>,
}

impl IdentifyOutcome {
    /// True when the store was reached but looks like the other database.
    pub fn looks_swapped(&self) -> bool {
        self.inventory
            .as_ref()
            .map(|inv| inv.kind != StoreKind::Unknown && !inv.matches_role(self.configured_as))
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
struct LabelRow {
    label: String,
}

#[derive(Deserialize)]
struct RelTypeRow {
    #[serde(rename = "relationshipType")]
    relationship_type: String,
}

#[derive(Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Deserialize)]
struct KeysRow {
    keys: Vec<String>,
}

/// Read labels, counts, relationship types and sample property keys.
pub async fn inspect_store(connection: &GraphConnection) -> GraphResult<StoreInventory> {
    let labels: Vec<String> = connection
        .fetch::<LabelRow>(query(cypher::LABELS))
        .await?
        .into_iter()
        .map(|r| r.label)
        .collect();

    let mut counts = Vec::with_capacity(labels.len());
    for label in &labels {
        let rows: Vec<CountRow> = connection.fetch(query(&cypher::count_label(label))).await?;
        counts.push(LabelCount {
            label: label.clone(),
            count: rows.first().map(|r| r.count).unwrap_or(0),
        });
    }

    let relationship_types = connection
        .fetch::<RelTypeRow>(query(cypher::RELATIONSHIP_TYPES))
        .await?
        .into_iter()
        .map(|r| r.relationship_type)
        .collect();

    let mut samples = Vec::new();
    for label in labels.iter().take(SAMPLED_LABELS) {
        let rows: Vec<KeysRow> = connection.fetch(query(&cypher::sample_keys(label))).await?;
        if let Some(row) = rows.into_iter().next() {
            samples.push(LabelSample {
                label: label.clone(),
                properties: row.keys,
            });
        }
    }

    let kind = StoreKind::classify(&labels);
    Ok(StoreInventory {
        uri: connection.uri().to_string(),
        labels,
        counts,
        relationship_types,
        samples,
        kind,
    })
}

/// Connect to one configured store and identify it. Never fails: errors are
/// logged and reported inside the outcome.
pub async fn identify_store(config: &StoreConfig, configured_as: StoreRole) -> IdentifyOutcome {
    let result = match GraphConnection::connect(config).await {
        Ok(connection) => inspect_store(&connection).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(inventory) => IdentifyOutcome {
            configured_as,
            uri: config.uri.clone(),
            inventory: Some(inventory),
            error: None,
        },
        Err(e) => {
            warn!(uri = %config.uri, role = %configured_as, error = %e, "could not identify store");
            IdentifyOutcome {
                configured_as,
                uri: config.uri.clone(),
                inventory: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Identify both configured stores concurrently, research store first.
pub async fn identify_stores(research: &StoreConfig, thesis: &StoreConfig) -> Vec<IdentifyOutcome> {
    let (research, thesis) = tokio::join!(
        identify_store(research, StoreRole::Research),
        identify_store(thesis, StoreRole::Thesis),
    );
    vec![research, thesis]
}
