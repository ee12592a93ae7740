//! MCP `register` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RegisterParams {
    #[schemars(description = "E-mail address; the account id is derived from it")]
    pub email: String,

    #[schemars(description = "Display name")]
    pub name: Option<String>,

    #[schemars(description = "Password, at least 6 characters. Only checked, never stored.")]
    pub password: String,

    #[schemars(description = "Must equal 'password'")]
    pub confirm_password: String,
}
