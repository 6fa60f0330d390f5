//! Cross-database expert merge
//!
//! Folds the per-database topic-search rows into one list keyed by exact
//! name string and ranks it by a combined score:
//! `relevant_publications + thesis_weight * relevant_theses`.

use crate::graph::{PublicationExpert, ThesisExpert};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Default weight of one relevant thesis relative to one relevant publication.
pub const DEFAULT_THESIS_WEIGHT: f64 = 0.5;

/// Which databases contributed to an expert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpertSource {
    #[serde(rename = "database_1")]
    Database1,
    #[serde(rename = "database_2")]
    Database2,
    #[serde(rename = "both_databases")]
    BothDatabases,
}

/// One merged expert. Fields a database did not contribute stay zero/empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertRecord {
    pub name: String,
    pub orcid_id: Option<String>,
    pub relevant_publications: u32,
    pub sample_publications: Vec<String>,
    pub organizations: Vec<String>,
    pub departments: Vec<String>,
    pub thesis_roles: Vec<String>,
    pub relevant_theses: u32,
    pub sample_theses: Vec<String>,
    pub combined_score: f64,
    pub source: ExpertSource,
}

impl ExpertRecord {
    fn empty(name: String, source: ExpertSource) -> Self {
        Self {
            name,
            orcid_id: None,
            relevant_publications: 0,
            sample_publications: Vec::new(),
            organizations: Vec::new(),
            departments: Vec::new(),
            thesis_roles: Vec::new(),
            relevant_theses: 0,
            sample_theses: Vec::new(),
            combined_score: 0.0,
            source,
        }
    }
}

/// Merges publication-based and thesis-based expert lists.
#[derive(Debug, Clone, Copy)]
pub struct ExpertMerger {
    /// Score contributed by each relevant thesis
    pub thesis_weight: f64,
    /// Cap applied when a repeated name extends a sample list
    pub sample_titles: usize,
}

impl Default for ExpertMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpertMerger {
    pub fn new() -> Self {
        Self {
            thesis_weight: DEFAULT_THESIS_WEIGHT,
            sample_titles: 3,
        }
    }

    pub fn with_thesis_weight(mut self, weight: f64) -> Self {
        self.thesis_weight = weight;
        self
    }

    pub fn with_sample_titles(mut self, cap: usize) -> Self {
        self.sample_titles = cap;
        self
    }

    /// Merge the two lists.
    ///
    /// Output is sorted by combined score descending, ties by name ascending.
    /// A name seen in both lists appears once with [`ExpertSource::BothDatabases`].
    pub fn merge(
        &self,
        publication_experts: Vec<PublicationExpert>,
        thesis_experts: Vec<ThesisExpert>,
    ) -> Vec<ExpertRecord> {
        let db1_len = publication_experts.len();
        let db2_len = thesis_experts.len();

        let mut merged: HashMap<String, ExpertRecord> = HashMap::new();

        for expert in publication_experts {
            let record = merged
                .entry(expert.name.clone())
                .or_insert_with(|| {
                    ExpertRecord::empty(expert.name.clone(), ExpertSource::Database1)
                });
            if record.orcid_id.is_none() {
                record.orcid_id = expert.orcid_id;
            }
            record.relevant_publications += expert.relevant_publications;
            extend_capped(
                &mut record.sample_publications,
                expert.sample_publications,
                self.sample_titles,
            );
            extend_unique(&mut record.organizations, expert.organizations);
            extend_unique(&mut record.departments, expert.departments);
            record.combined_score += f64::from(expert.relevant_publications);
        }

        for expert in thesis_experts {
            let record = merged
                .entry(expert.name.clone())
                .or_insert_with(|| {
                    ExpertRecord::empty(expert.name.clone(), ExpertSource::Database2)
                });
            if record.source == ExpertSource::Database1 {
                record.source = ExpertSource::BothDatabases;
            }
            extend_unique(&mut record.thesis_roles, expert.roles);
            record.relevant_theses += expert.relevant_theses;
            extend_capped(&mut record.sample_theses, expert.sample_theses, self.sample_titles);
            record.combined_score += f64::from(expert.relevant_theses) * self.thesis_weight;
        }

        // Names are unique keys, so score then name fully orders the output.
        let mut records: Vec<ExpertRecord> = merged.into_values().collect();
        records.sort_by(|a, b| {
            b.combined_score
                .total_cmp(&a.combined_score)
                .then_with(|| a.name.cmp(&b.name))
        });

        debug!(db1 = db1_len, db2 = db2_len, merged = records.len(), "merged expert lists");
        records
    }
}

fn extend_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn extend_capped(target: &mut Vec<String>, items: Vec<String>, cap: usize) {
    for item in items {
        if target.len() >= cap {
            break;
        }
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
