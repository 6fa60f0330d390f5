//! Graph store access
//!
//! Two independently addressed databases sit behind the [`ResearchStore`] and
//! [`ThesisStore`] traits. Each has a Neo4j implementation and an in-memory
//! one evaluating the same query shapes.

pub mod cypher;
mod identify;
mod memory;
mod neo4j;
mod traits;
mod types;

pub use identify::{
    identify_store, identify_stores, inspect_store, IdentifyOutcome, LabelCount, LabelSample,
    StoreInventory, StoreKind,
};
pub use memory::{MemoryResearchStore, MemoryThesisStore};
pub use neo4j::{GraphConnection, Neo4jResearchStore, Neo4jThesisStore};
pub use traits::{GraphError, GraphResult, QueryPolicy, ResearchStore, ThesisStore};
pub use types::{
    query_tokens, Affiliation, MatchStrategy, Person, Publication, PublicationExpert,
    ResearcherProfile, StoreRole, Thesis, ThesisActivity, ThesisExpert,
};
