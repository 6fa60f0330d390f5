//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LookupPersonParams {
    #[schemars(description = "Full or partial name of the person (case-insensitive)")]
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindExpertParams {
    #[schemars(description = "Topic to search publications and theses for")]
    pub topic: String,
    #[schemars(description = "Maximum rows taken from each database (default 10)")]
    pub limit: Option<usize>,
}
