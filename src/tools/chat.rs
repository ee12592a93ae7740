//! MCP `chat` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Provide either `message` or `quick_action`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatParams {
    #[schemars(description = "Account id returned by 'register'")]
    pub user_id: String,

    #[schemars(description = "What the user says. Required unless 'quick_action' is given.")]
    pub message: Option<String>,

    #[schemars(description = "Canned opener instead of a message: 'recall', 'checkin' or 'story'")]
    pub quick_action: Option<String>,

    #[schemars(description = "Optional JSON stored with the conversation memory")]
    pub context: Option<serde_json::Value>,
}
