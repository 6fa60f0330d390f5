//! Configuration
//!
//! Layered with figment, lowest to highest priority:
//! 1. built-in defaults
//! 2. user config (`<config dir>/researchbook/config.yaml`)
//! 3. `./researchbook.yaml`, or an explicit path
//! 4. `RESEARCHBOOK_*` environment variables (`__` separates nesting,
//!    e.g. `RESEARCHBOOK_LLM__MODEL`). Text fields such as passwords are
//!    re-read verbatim, so an all-digit value stays a string.
//! 5. the flat `NEO4J_DB1_*`, `NEO4J_DB2_*` and `LIGHTLLM_*` variables

use crate::graph::{MatchStrategy, QueryPolicy};
use crate::merge::DEFAULT_THESIS_WEIGHT;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory and the user config dir.
pub const CONFIG_FILE_NAME: &str = "researchbook.yaml";

/// Prefix for structured environment overrides.
pub const ENV_PREFIX: &str = "RESEARCHBOOK_";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4";

/// Flat environment variables and the config key each one sets.
pub const LEGACY_ENV: &[(&str, &str)] = &[
    ("NEO4J_DB1_URI", "research_db.uri"),
    ("NEO4J_DB1_USERNAME", "research_db.user"),
    ("NEO4J_DB1_PASSWORD", "research_db.password"),
    ("NEO4J_DB2_URI", "thesis_db.uri"),
    ("NEO4J_DB2_USERNAME", "thesis_db.user"),
    ("NEO4J_DB2_PASSWORD", "thesis_db.password"),
    ("LIGHTLLM_URL", "llm.url"),
    ("LIGHTLLM_API_KEY", "llm.api_key"),
    ("LIGHTLLM_MODEL", "llm.model"),
];

/// Keys holding free text. figment parses environment values, so an all-digit
/// password would otherwise arrive as a number (and lose leading zeros).
pub const STRING_KEYS: &[&str] = &[
    "research_db.uri",
    "research_db.user",
    "research_db.password",
    "research_db.database",
    "thesis_db.uri",
    "thesis_db.user",
    "thesis_db.password",
    "thesis_db.database",
    "llm.url",
    "llm.api_key",
    "llm.model",
];

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Connection parameters for one graph database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name inside the server
    pub database: String,
    /// Pool size
    pub max_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            max_connections: 4,
        }
    }
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full URL of the chat-completions endpoint
    pub url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_secs: u64,
    /// Skip TLS certificate verification (self-signed gateways)
    pub accept_invalid_certs: bool,
    /// Token budget for a person profile
    pub profile_max_tokens: u32,
    /// Token budget for an expert ranking
    pub ranking_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            timeout_secs: 30,
            accept_invalid_certs: false,
            profile_max_tokens: 1000,
            ranking_max_tokens: 1500,
        }
    }
}

/// Scoring weight and result-size caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub thesis_weight: f64,
    pub profile_rows: usize,
    pub thesis_rows: usize,
    pub sample_titles: usize,
    pub sample_affiliations: usize,
    pub default_expert_limit: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            thesis_weight: DEFAULT_THESIS_WEIGHT,
            profile_rows: 10,
            thesis_rows: 20,
            sample_titles: 3,
            sample_affiliations: 2,
            default_expert_limit: 10,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub research_db: StoreConfig,
    pub thesis_db: StoreConfig,
    pub llm: LlmConfig,
    pub matching: MatchStrategy,
    pub policy: ScoringPolicy,
}

impl Config {
    /// Query shape parameters handed to the stores.
    pub fn query_policy(&self) -> QueryPolicy {
        QueryPolicy {
            matching: self.matching,
            profile_rows: self.policy.profile_rows,
            thesis_rows: self.policy.thesis_rows,
            sample_titles: self.policy.sample_titles,
            sample_affiliations: self.policy.sample_affiliations,
        }
    }

    /// Check the settings needed to reach both databases.
    pub fn validate_stores(&self) -> Result<(), ConfigError> {
        if self.research_db.uri.trim().is_empty() {
            return Err(ConfigError::Missing("research_db.uri"));
        }
        if self.thesis_db.uri.trim().is_empty() {
            return Err(ConfigError::Missing("thesis_db.uri"));
        }
        Ok(())
    }

    /// Check everything the two public operations need.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_stores()?;
        if self.llm.url.trim().is_empty() {
            return Err(ConfigError::Missing("llm.url"));
        }
        if !self.policy.thesis_weight.is_finite() || self.policy.thesis_weight < 0.0 {
            return Err(ConfigError::Invalid {
                field: "policy.thesis_weight",
                reason: format!("must be a non-negative number, got {}", self.policy.thesis_weight),
            });
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "llm.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.policy.default_expert_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "policy.default_expert_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// One-line description for logs. Secrets are never included.
    pub fn summary(&self) -> String {
        format!(
            "research_db={} thesis_db={} llm={} model={} matching={:?} api_key={}",
            self.research_db.uri,
            self.thesis_db.uri,
            self.llm.url,
            self.llm.model,
            self.matching,
            if self.llm.api_key.is_empty() { "unset" } else { "set" },
        )
    }
}

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("researchbook").join("config.yaml"))
}

/// Collect `(key, value)` overrides from the flat legacy variables.
pub fn legacy_overrides(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, String)> {
    LEGACY_ENV
        .iter()
        .filter_map(|(var, key)| lookup(var).map(|value| (*key, value)))
        .collect()
}

/// Structured environment variable that sets `key`,
/// e.g. `llm.api_key` -> `RESEARCHBOOK_LLM__API_KEY`.
pub fn env_var_for(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.replace('.', "__").to_uppercase())
}

/// Collect the `RESEARCHBOOK_*` values of [`STRING_KEYS`] verbatim.
pub fn string_overrides(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, String)> {
    STRING_KEYS
        .iter()
        .filter_map(|key| lookup(&env_var_for(key)).map(|value| (*key, value)))
        .collect()
}

/// Re-apply text settings as strings, then the legacy variables on top.
fn merge_string_overrides(
    mut figment: Figment,
    lookup: impl Fn(&str) -> Option<String>,
) -> Figment {
    let overrides = string_overrides(&lookup)
        .into_iter()
        .chain(legacy_overrides(&lookup));
    for (key, value) in overrides {
        figment = figment.merge(Serialized::default(key, value));
    }
    figment
}

/// Build the layered figment.
///
/// `config_path` replaces the working-directory file; it must exist.
/// With `include_env` false only defaults and files are used.
pub fn figment(config_path: Option<&Path>, include_env: bool) -> Result<Figment, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Yaml::file(&user_config));
        }
    }

    match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                figment = figment.merge(Yaml::file(local));
            }
        }
    }

    if include_env {
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        figment = merge_string_overrides(figment, |var| std::env::var(var).ok());
    }

    Ok(figment)
}

/// Load configuration from every layer, reading `.env` first.
pub fn load_config(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    // A missing .env is the normal case
    let _ = dotenvy::dotenv();
    figment(config_path, true)?
        .extract()
        .map_err(|e| ConfigError::Figment(Box::new(e)))
}
