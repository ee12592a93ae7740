use anyhow::Result;
use serde::Serialize;

use echosoul::account::UserProfile;
use echosoul::config::EchoConfig;
use echosoul::memory::types::Memory;
use echosoul::personality::Personality;

/// Everything stored for one user, minus the vault.
#[derive(Debug, Serialize)]
struct ExportData {
    profile: Option<UserProfile>,
    personality: Option<Personality>,
    memories: Vec<Memory>,
    exported_at: String,
}

/// Export a user's profile, personality and memories as JSON to stdout.
///
/// Vault entries stay encrypted and are left out.
pub fn export(config: &EchoConfig, email: &str) -> Result<()> {
    let conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;

    let data = ExportData {
        profile: echosoul::account::get_profile(&conn, &user_id)?,
        personality: echosoul::personality::load(&conn, &user_id)?,
        memories: echosoul::memory::timeline::get_timeline(&conn, &user_id, None, None, None)?,
        exported_at: chrono::Utc::now().to_rfc3339(),
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!("Exported {} memories.", data.memories.len());
    Ok(())
}
