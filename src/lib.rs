//! ResearchBook: Researcher Intelligence over Two Graph Databases
//!
//! Answers two questions about academic researchers by combining a
//! research-intelligence graph (people, publications, affiliations) with a
//! thesis-relationship graph (supervision, examination, authorship) and asking
//! an LLM to summarize the combined records.
//!
//! # Core Concepts
//!
//! - **Stores**: [`ResearchStore`] and [`ThesisStore`], each backed by Neo4j or memory
//! - **Merge**: expert rows from both stores folded by name into one ranked list
//! - **Book**: [`ResearchBook`] runs the queries, merge, prompt and LLM call
//!
//! # Example
//!
//! ```
//! use researchbook::{MemoryResearchStore, MemoryThesisStore, MockLlmClient, ResearchBook};
//! use std::sync::Arc;
//!
//! let book = ResearchBook::in_memory(
//!     MemoryResearchStore::new(),
//!     MemoryThesisStore::new(),
//!     Arc::new(MockLlmClient::replying("summary")),
//! );
//! // Book is ready for use
//! # let _ = book;
//! ```

pub mod book;
pub mod config;
pub mod graph;
pub mod llm;
pub mod mcp;
pub mod merge;
pub mod prompt;

pub use book::{BookError, BookResult, ExpertSearch, PersonLookup, ResearchBook};
pub use config::{load_config, Config, ConfigError, LlmConfig, ScoringPolicy, StoreConfig};
pub use graph::{
    GraphError, MatchStrategy, MemoryResearchStore, MemoryThesisStore, ResearchStore, StoreRole,
    ThesisStore,
};
pub use llm::{ChatCompletionClient, LlmClient, LlmError, MockLlmClient};
pub use merge::{ExpertMerger, ExpertRecord, ExpertSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
