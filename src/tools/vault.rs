//! MCP vault tool parameter definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VaultStoreParams {
    #[schemars(description = "Account id returned by 'register'")]
    pub user_id: String,

    #[schemars(description = "Vault password")]
    pub password: String,

    #[schemars(description = "Title; 'Untitled Memory' when omitted")]
    pub title: Option<String>,

    #[schemars(description = "The private memory")]
    pub content: String,

    #[schemars(
        description = "Memory type: 'personal', 'secret', 'dream', 'goal', 'reflection', 'confession'. Defaults to 'personal'."
    )]
    pub r#type: Option<String>,

    #[schemars(description = "Emotion name, e.g. 'joy' or 'nostalgia'. Detected from the content when omitted.")]
    pub emotion: Option<String>,

    #[schemars(description = "Free-form tags")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VaultListParams {
    #[schemars(description = "Account id returned by 'register'")]
    pub user_id: String,

    #[schemars(description = "Vault password")]
    pub password: String,

    #[schemars(description = "Case-insensitive text to look for in titles and content")]
    pub query: Option<String>,

    #[schemars(description = "Sort order: 'newest' (default), 'oldest' or 'emotion'")]
    pub sort: Option<String>,
}
