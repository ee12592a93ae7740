//! MCP `recall_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallMemoryParams {
    #[schemars(description = "Account id returned by 'register'")]
    pub user_id: String,

    #[schemars(description = "Natural language query")]
    pub query: String,

    /// Memory kind filter.
    #[schemars(
        description = "Filter by type: 'conversation', 'personal', 'secret', 'dream', 'goal', 'reflection', 'confession'"
    )]
    pub r#type: Option<String>,

    #[schemars(description = "Maximum number of results to return (1-20). Defaults to 5.")]
    pub max_results: Option<usize>,
}
