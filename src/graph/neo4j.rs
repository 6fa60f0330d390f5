//! Neo4j-backed stores
//!
//! Each store owns one pooled `neo4rs::Graph` for its whole lifetime. Every
//! query checks a session out of the pool and returns it when the row stream
//! is dropped, whether or not the query succeeded.

use super::cypher;
use super::traits::{GraphError, GraphResult, QueryPolicy, ResearchStore, ThesisStore};
use super::types::{
    query_tokens, Affiliation, MatchStrategy, PublicationExpert, ResearcherProfile,
    ThesisActivity, ThesisExpert,
};
use crate::config::StoreConfig;
use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Query};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// A verified, pooled connection to one graph database.
#[derive(Clone)]
pub struct GraphConnection {
    graph: Arc<Graph>,
    uri: String,
}

impl GraphConnection {
    /// Connect and run a trivial query so bad addresses or credentials fail
    /// here rather than on the first lookup.
    pub async fn connect(config: &StoreConfig) -> GraphResult<Self> {
        let neo_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .build()
            .map_err(GraphError::Connection)?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(GraphError::Connection)?;

        let connection = Self {
            graph: Arc::new(graph),
            uri: config.uri.clone(),
        };
        connection.ping().await?;
        info!(uri = %connection.uri, database = %config.database, "connected to graph store");
        Ok(connection)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    async fn ping(&self) -> GraphResult<()> {
        let mut stream = self
            .graph
            .execute(query(cypher::PING))
            .await
            .map_err(GraphError::Connection)?;
        while stream
            .next()
            .await
            .map_err(GraphError::Connection)?
            .is_some()
        {}
        Ok(())
    }

    /// Run a read query and decode every row into `T`.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, q: Query) -> GraphResult<Vec<T>> {
        let mut stream = self.graph.execute(q).await.map_err(GraphError::Query)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(GraphError::Query)? {
            rows.push(row.to::<T>()?);
        }
        Ok(rows)
    }
}

/// Bind `$name` or `$tokens` to match the predicate the strategy produced.
fn bind_name(q: Query, name: &str, strategy: MatchStrategy) -> Query {
    match strategy {
        MatchStrategy::Tokens => q.param("tokens", query_tokens(name)),
        MatchStrategy::Substring | MatchStrategy::Exact => q.param("name", name),
    }
}

fn as_count(n: i64) -> u32 {
    n.clamp(0, i64::from(u32::MAX)) as u32
}

fn as_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProfileRow {
    name: String,
    orcid_id: Option<String>,
    given_names: Option<String>,
    family_name: Option<String>,
    orcid_publication_count: Option<i64>,
    #[serde(default)]
    affiliations: Vec<AffiliationRow>,
    total_publications: i64,
}

/// `OPTIONAL MATCH` yields one all-null map when a person has no affiliation.
#[derive(Debug, Deserialize)]
struct AffiliationRow {
    organization: Option<String>,
    role: Option<String>,
    department: Option<String>,
    start_year: Option<i64>,
    end_year: Option<i64>,
}

impl From<ProfileRow> for ResearcherProfile {
    fn from(row: ProfileRow) -> Self {
        let affiliations = row
            .affiliations
            .into_iter()
            .filter_map(|a| {
                Some(Affiliation {
                    organization: a.organization?,
                    role: a.role,
                    department: a.department,
                    start_year: a.start_year,
                    end_year: a.end_year,
                })
            })
            .collect();
        Self {
            name: row.name,
            orcid_id: row.orcid_id,
            given_names: row.given_names,
            family_name: row.family_name,
            orcid_publication_count: row.orcid_publication_count,
            total_publications: as_count(row.total_publications),
            affiliations,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActivityRow {
    person_name: String,
    role: String,
    thesis_title: Option<String>,
    thesis_type: Option<String>,
    keywords: Option<Vec<String>>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

impl From<ActivityRow> for ThesisActivity {
    fn from(row: ActivityRow) -> Self {
        Self {
            person_name: row.person_name,
            role: row.role,
            thesis_title: row.thesis_title,
            thesis_type: row.thesis_type,
            keywords: row.keywords.unwrap_or_default(),
            abstract_text: row.abstract_text.unwrap_or_default(),
        }
    }
}

/// Topic rows carry `p.name` unfiltered, so a nameless person node shows up
/// as `None` and is skipped.
#[derive(Debug, Deserialize)]
struct PublicationExpertRow {
    name: Option<String>,
    orcid_id: Option<String>,
    relevant_publications: i64,
    #[serde(default)]
    sample_publications: Vec<String>,
    #[serde(default)]
    organizations: Vec<String>,
    #[serde(default)]
    departments: Vec<String>,
}

impl PublicationExpertRow {
    fn into_expert(self) -> Option<PublicationExpert> {
        Some(PublicationExpert {
            name: self.name?,
            orcid_id: self.orcid_id,
            relevant_publications: as_count(self.relevant_publications),
            sample_publications: self.sample_publications,
            organizations: self.organizations,
            departments: self.departments,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ThesisExpertRow {
    name: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    relevant_theses: i64,
    #[serde(default)]
    sample_theses: Vec<String>,
}

impl ThesisExpertRow {
    fn into_expert(self) -> Option<ThesisExpert> {
        Some(ThesisExpert {
            name: self.name?,
            roles: self.roles,
            relevant_theses: as_count(self.relevant_theses),
            sample_theses: self.sample_theses,
        })
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Research-intelligence database (people, publications, organizations).
pub struct Neo4jResearchStore {
    connection: GraphConnection,
    policy: QueryPolicy,
}

impl Neo4jResearchStore {
    pub fn new(connection: GraphConnection, policy: QueryPolicy) -> Self {
        Self { connection, policy }
    }

    pub async fn connect(config: &StoreConfig, policy: QueryPolicy) -> GraphResult<Self> {
        Ok(Self::new(GraphConnection::connect(config).await?, policy))
    }
}

#[async_trait]
impl ResearchStore for Neo4jResearchStore {
    async fn researcher_profiles(&self, name: &str) -> GraphResult<Vec<ResearcherProfile>> {
        let q = query(&cypher::researcher_profiles(self.policy.matching))
            .param("limit", as_limit(self.policy.profile_rows));
        let q = bind_name(q, name, self.policy.matching);

        let rows: Vec<ProfileRow> = self.connection.fetch(q).await?;
        debug!(
            uri = %self.connection.uri(),
            query = name,
            rows = rows.len(),
            "researcher profiles"
        );
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn publication_experts(
        &self,
        topic: &str,
        limit: usize,
    ) -> GraphResult<Vec<PublicationExpert>> {
        let q = query(cypher::PUBLICATION_EXPERTS)
            .param("topic", topic)
            .param("limit", as_limit(limit))
            .param("sample_titles", as_limit(self.policy.sample_titles))
            .param("sample_affiliations", as_limit(self.policy.sample_affiliations));

        let rows: Vec<PublicationExpertRow> = self.connection.fetch(q).await?;
        debug!(uri = %self.connection.uri(), topic, rows = rows.len(), "publication experts");
        Ok(rows
            .into_iter()
            .filter_map(PublicationExpertRow::into_expert)
            .collect())
    }
}

/// Thesis-relationships database (people and the theses they touched).
pub struct Neo4jThesisStore {
    connection: GraphConnection,
    policy: QueryPolicy,
}

impl Neo4jThesisStore {
    pub fn new(connection: GraphConnection, policy: QueryPolicy) -> Self {
        Self { connection, policy }
    }

    pub async fn connect(config: &StoreConfig, policy: QueryPolicy) -> GraphResult<Self> {
        Ok(Self::new(GraphConnection::connect(config).await?, policy))
    }
}

#[async_trait]
impl ThesisStore for Neo4jThesisStore {
    async fn thesis_activities(&self, name: &str) -> GraphResult<Vec<ThesisActivity>> {
        let q = query(&cypher::thesis_activities(self.policy.matching))
            .param("limit", as_limit(self.policy.thesis_rows));
        let q = bind_name(q, name, self.policy.matching);

        let rows: Vec<ActivityRow> = self.connection.fetch(q).await?;
        debug!(uri = %self.connection.uri(), query = name, rows = rows.len(), "thesis activities");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn thesis_experts(&self, topic: &str, limit: usize) -> GraphResult<Vec<ThesisExpert>> {
        let q = query(cypher::THESIS_EXPERTS)
            .param("topic", topic)
            .param("limit", as_limit(limit))
            .param("sample_titles", as_limit(self.policy.sample_titles));

        let rows: Vec<ThesisExpertRow> = self.connection.fetch(q).await?;
        debug!(uri = %self.connection.uri(), topic, rows = rows.len(), "thesis experts");
        Ok(rows.into_iter().filter_map(ThesisExpertRow::into_expert).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_affiliation_maps_are_dropped() {
        let row = ProfileRow {
            name: "Anders Svensson".into(),
            orcid_id: None,
            given_names: None,
            family_name: None,
            orcid_publication_count: Some(12),
            affiliations: vec![
                AffiliationRow {
                    organization: None,
                    role: None,
                    department: None,
                    start_year: None,
                    end_year: None,
                },
                AffiliationRow {
                    organization: Some("Chalmers".into()),
                    role: Some("Professor".into()),
                    department: None,
                    start_year: Some(2010),
                    end_year: None,
                },
            ],
            total_publications: 7,
        };

        let profile = ResearcherProfile::from(row);
        assert_eq!(profile.affiliations.len(), 1);
        assert_eq!(profile.affiliations[0].organization, "Chalmers");
        assert_eq!(profile.total_publications, 7);
    }

    #[test]
    fn missing_thesis_fields_become_empty() {
        let row = ActivityRow {
            person_name: "Maria Berg".into(),
            role: "EXAMINED".into(),
            thesis_title: Some("On Things".into()),
            thesis_type: None,
            keywords: None,
            abstract_text: None,
        };
        let activity = ThesisActivity::from(row);
        assert!(activity.keywords.is_empty());
        assert_eq!(activity.abstract_text, "");
    }

    #[test]
    fn nameless_expert_rows_are_skipped() {
        let rows: Vec<PublicationExpertRow> = serde_json::from_value(serde_json::json!([
            {"name": null, "orcid_id": null, "relevant_publications": 9},
            {"name": "Maria Berg", "orcid_id": null, "relevant_publications": 2,
             "sample_publications": ["Optics"], "organizations": ["KTH"], "departments": []},
        ]))
        .unwrap();
        let experts: Vec<PublicationExpert> = rows
            .into_iter()
            .filter_map(PublicationExpertRow::into_expert)
            .collect();
        assert_eq!(experts.len(), 1);
        assert_eq!(experts[0].name, "Maria Berg");
        assert_eq!(experts[0].relevant_publications, 2);

        let rows: Vec<ThesisExpertRow> = serde_json::from_value(serde_json::json!([
            {"name": null, "roles": ["SUPERVISED"], "relevant_theses": 1},
        ]))
        .unwrap();
        assert!(rows.into_iter().all(|r| r.into_expert().is_none()));
    }

    #[test]
    fn counts_are_clamped() {
        assert_eq!(as_count(-3), 0);
        assert_eq!(as_count(42), 42);
        assert_eq!(as_count(i64::MAX), u32::MAX);
    }
}
