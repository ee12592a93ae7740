use anyhow::Result;

use echosoul::config::EchoConfig;

/// Permanently delete one of the user's (non-vault) memories.
pub fn forget(config: &EchoConfig, email: &str, id: &str) -> Result<()> {
    let mut conn = super::open_db(config)?;
    let user_id = super::resolve_user(&conn, email)?;
    echosoul::memory::forget::delete_memory(&mut conn, &user_id, id)?;
    println!("Memory {id} forgotten.");
    Ok(())
}
