//! MCP `timeline` and `emotion_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Both bounds are inclusive and accept `YYYY-MM-DD` or RFC 3339.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TimelineParams {
    #[schemars(description = "Account id returned by 'register'")]
    pub user_id: String,

    #[schemars(description = "Earliest date, YYYY-MM-DD or RFC 3339 (inclusive)")]
    pub start_date: Option<String>,

    #[schemars(description = "Latest date, YYYY-MM-DD or RFC 3339 (inclusive)")]
    pub end_date: Option<String>,

    #[schemars(
        description = "Only this memory kind: conversation, personal, secret, dream, goal, reflection, confession"
    )]
    pub r#type: Option<String>,
}
