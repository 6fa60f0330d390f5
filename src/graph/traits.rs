//! Store trait definitions

use super::types::{
    MatchStrategy, PublicationExpert, ResearcherProfile, ThesisActivity, ThesisExpert,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while querying a graph store
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Connection failed: {0}")]
    Connection(#[source] neo4rs::Error),

    #[error("Query failed: {0}")]
    Query(#[source] neo4rs::Error),

    #[error("Unexpected row shape: {0}")]
    Decode(#[from] neo4rs::DeError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Shape parameters shared by every store query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPolicy {
    pub matching: MatchStrategy,
    /// Cap on rows returned by the person-profile query
    pub profile_rows: usize,
    /// Cap on rows returned by the thesis-activity query
    pub thesis_rows: usize,
    /// Sample titles kept per expert row
    pub sample_titles: usize,
    /// Organizations and departments kept per expert row
    pub sample_affiliations: usize,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            matching: MatchStrategy::Substring,
            profile_rows: 10,
            thesis_rows: 20,
            sample_titles: 3,
            sample_affiliations: 2,
        }
    }
}

/// Database 1: researchers, organizations and authored publications.
///
/// Implementations must be thread-safe so the orchestrator can run the two
/// stores' queries concurrently.
#[async_trait]
pub trait ResearchStore: Send + Sync {
    /// Person-profile shape: one aggregated row per matching person.
    async fn researcher_profiles(&self, name: &str) -> GraphResult<Vec<ResearcherProfile>>;

    /// Topic search over publication title, keywords and abstract,
    /// ordered by relevant-publication count descending.
    async fn publication_experts(
        &self,
        topic: &str,
        limit: usize,
    ) -> GraphResult<Vec<PublicationExpert>>;
}

/// Database 2: theses and the typed relations people have to them.
#[async_trait]
pub trait ThesisStore: Send + Sync {
    /// Thesis-activity shape: one row per (person, relation, thesis).
    async fn thesis_activities(&self, name: &str) -> GraphResult<Vec<ThesisActivity>>;

    /// Topic search over thesis title, keywords and abstract, grouped by
    /// person and relation type, ordered by relevant-thesis count descending.
    async fn thesis_experts(&self, topic: &str, limit: usize) -> GraphResult<Vec<ThesisExpert>>;
}
