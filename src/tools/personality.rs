//! MCP personality tool parameter definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PersonalityGetParams {
    #[schemars(description = "Account id returned by 'register'")]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PersonalityUpdateParams {
    #[schemars(description = "Account id returned by 'register'")]
    pub user_id: String,

    #[schemars(
        description = "Traits to set, e.g. {\"tone\": \"warm\", \"humor_level\": \"high\", \"memory_recall_frequency\": 0.6}"
    )]
    pub traits: serde_json::Map<String, serde_json::Value>,
}
