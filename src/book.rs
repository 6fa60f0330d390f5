//! ResearchBook: the orchestrator behind the two public operations
//!
//! Each operation queries both stores (concurrently), optionally merges,
//! builds a prompt, and asks the LLM for a summary. Store failures abort the
//! operation; LLM failures are downgraded to a tagged string so the database
//! results are still returned.

use crate::config::{Config, ConfigError, ScoringPolicy};
use crate::graph::{
    GraphError, MemoryResearchStore, MemoryThesisStore, Neo4jResearchStore, Neo4jThesisStore,
    ResearchStore, ResearcherProfile, StoreRole, ThesisActivity, ThesisStore,
};
use crate::llm::{ai_error_text, is_ai_error, ChatCompletionClient, LlmClient, LlmError};
use crate::merge::{ExpertMerger, ExpertRecord};
use crate::prompt::{expert_ranking_prompt, person_analysis_prompt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// AI text used when neither database knows the person.
pub const PERSON_NOT_FOUND: &str = "Person not found in either database";

/// AI text used when no expert matched the topic.
pub fn no_experts_message(topic: &str) -> String {
    format!("No experts found for topic: {topic}")
}

/// Errors that abort a ResearchBook operation
#[derive(Debug, Error)]
pub enum BookError {
    #[error("{role} query failed: {source}")]
    Graph {
        role: StoreRole,
        #[source]
        source: GraphError,
    },

    #[error("Query text is empty")]
    EmptyQuery,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("LLM client setup failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BookError {
    fn graph(role: StoreRole) -> impl FnOnce(GraphError) -> Self {
        move |source| BookError::Graph { role, source }
    }
}

/// Result type for ResearchBook operations
pub type BookResult<T> = Result<T, BookError>;

/// Everything known about one person query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonLookup {
    pub name: String,
    pub found_in_db1: bool,
    pub found_in_db2: bool,
    pub researcher_data: Vec<ResearcherProfile>,
    pub thesis_data: Vec<ThesisActivity>,
    pub ai_analysis: String,
    pub generated_at: DateTime<Utc>,
}

impl PersonLookup {
    pub fn found(&self) -> bool {
        self.found_in_db1 || self.found_in_db2
    }

    /// The summary request failed and `ai_analysis` holds the tagged error.
    pub fn ai_failed(&self) -> bool {
        is_ai_error(&self.ai_analysis)
    }
}

/// Ranked experts for one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertSearch {
    pub topic: String,
    pub experts_found: usize,
    pub db1_matches: usize,
    pub db2_matches: usize,
    pub expert_list: Vec<ExpertRecord>,
    pub ai_ranking: String,
    pub generated_at: DateTime<Utc>,
}

impl ExpertSearch {
    /// The ranking request failed and `ai_ranking` holds the tagged error.
    pub fn ai_failed(&self) -> bool {
        is_ai_error(&self.ai_ranking)
    }
}

/// The orchestrator. Holds one handle per store and one LLM client for its
/// whole lifetime.
pub struct ResearchBook {
    research: Arc<dyn ResearchStore>,
    thesis: Arc<dyn ThesisStore>,
    llm: Arc<dyn LlmClient>,
    merger: ExpertMerger,
    default_expert_limit: usize,
    profile_max_tokens: u32,
    ranking_max_tokens: u32,
}

impl ResearchBook {
    /// Assemble from already-built backends with default policy.
    pub fn new(
        research: Arc<dyn ResearchStore>,
        thesis: Arc<dyn ThesisStore>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let policy = ScoringPolicy::default();
        let llm_defaults = crate::config::LlmConfig::default();
        Self {
            research,
            thesis,
            llm,
            merger: ExpertMerger::new()
                .with_thesis_weight(policy.thesis_weight)
                .with_sample_titles(policy.sample_titles),
            default_expert_limit: policy.default_expert_limit,
            profile_max_tokens: llm_defaults.profile_max_tokens,
            ranking_max_tokens: llm_defaults.ranking_max_tokens,
        }
    }

    /// Backends held entirely in memory (tests, demos).
    pub fn in_memory(
        research: MemoryResearchStore,
        thesis: MemoryThesisStore,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self::new(Arc::new(research), Arc::new(thesis), llm)
    }

    /// Validate configuration, connect to both databases and build the HTTP
    /// client.
    pub async fn connect(config: &Config) -> BookResult<Self> {
        config.validate()?;
        info!(config = %config.summary(), "starting researchbook");

        let policy = config.query_policy();
        let (research, thesis) = tokio::join!(
            Neo4jResearchStore::connect(&config.research_db, policy),
            Neo4jThesisStore::connect(&config.thesis_db, policy),
        );
        let research = research.map_err(BookError::graph(StoreRole::Research))?;
        let thesis = thesis.map_err(BookError::graph(StoreRole::Thesis))?;
        let llm = ChatCompletionClient::new(&config.llm)?;

        Ok(Self::new(Arc::new(research), Arc::new(thesis), Arc::new(llm))
            .with_policy(config.policy)
            .with_token_budgets(config.llm.profile_max_tokens, config.llm.ranking_max_tokens))
    }

    pub fn with_policy(mut self, policy: ScoringPolicy) -> Self {
        self.merger = ExpertMerger::new()
            .with_thesis_weight(policy.thesis_weight)
            .with_sample_titles(policy.sample_titles);
        self.default_expert_limit = policy.default_expert_limit;
        self
    }

    pub fn with_token_budgets(mut self, profile: u32, ranking: u32) -> Self {
        self.profile_max_tokens = profile;
        self.ranking_max_tokens = ranking;
        self
    }

    pub fn default_expert_limit(&self) -> usize {
        self.default_expert_limit
    }

    /// "Tell me about person X": both databases' rows plus an AI profile.
    pub async fn lookup_person(&self, name: &str) -> BookResult<PersonLookup> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BookError::EmptyQuery);
        }
        info!(query = name, "looking up person");

        let (db1, db2) = tokio::join!(
            self.research.researcher_profiles(name),
            self.thesis.thesis_activities(name),
        );
        let researcher_data = db1.map_err(BookError::graph(StoreRole::Research))?;
        let thesis_data = db2.map_err(BookError::graph(StoreRole::Thesis))?;

        let found_in_db1 = !researcher_data.is_empty();
        let found_in_db2 = !thesis_data.is_empty();

        let ai_analysis = if found_in_db1 || found_in_db2 {
            let prompt = person_analysis_prompt(name, &researcher_data, &thesis_data)?;
            self.ai_query(&prompt, self.profile_max_tokens).await
        } else {
            PERSON_NOT_FOUND.to_string()
        };

        Ok(PersonLookup {
            name: name.to_string(),
            found_in_db1,
            found_in_db2,
            researcher_data,
            thesis_data,
            ai_analysis,
            generated_at: Utc::now(),
        })
    }

    /// "Who are the experts on topic Y": merged, ranked experts plus an AI
    /// ranking. `limit` caps each database's rows; `None` uses the configured
    /// default.
    pub async fn find_expert(&self, topic: &str, limit: Option<usize>) -> BookResult<ExpertSearch> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(BookError::EmptyQuery);
        }
        let limit = limit.unwrap_or(self.default_expert_limit);
        info!(topic, limit, "finding experts");

        let (db1, db2) = tokio::join!(
            self.research.publication_experts(topic, limit),
            self.thesis.thesis_experts(topic, limit),
        );
        let db1_experts = db1.map_err(BookError::graph(StoreRole::Research))?;
        let db2_experts = db2.map_err(BookError::graph(StoreRole::Thesis))?;

        let db1_matches = db1_experts.len();
        let db2_matches = db2_experts.len();
        let expert_list = self.merger.merge(db1_experts, db2_experts);

        let ai_ranking = if expert_list.is_empty() {
            no_experts_message(topic)
        } else {
            let prompt = expert_ranking_prompt(topic, &expert_list)?;
            self.ai_query(&prompt, self.ranking_max_tokens).await
        };

        Ok(ExpertSearch {
            topic: topic.to_string(),
            experts_found: expert_list.len(),
            db1_matches,
            db2_matches,
            expert_list,
            ai_ranking,
            generated_at: Utc::now(),
        })
    }

    /// Release both store handles and the HTTP client.
    pub fn close(self) {
        info!("closing researchbook connections");
        drop(self);
    }

    async fn ai_query(&self, prompt: &str, max_tokens: u32) -> String {
        match self.llm.complete(prompt, max_tokens).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "AI request failed, returning database results only");
                ai_error_text(&e)
            }
        }
    }
}
