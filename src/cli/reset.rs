//! CLI `reset` command: delete stored data after confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use echosoul::config::EchoConfig;

/// Delete one user's data, or everything when no user is given.
pub fn reset(config: &EchoConfig, email: Option<&str>) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = super::open_db(config)?;
    let user_id = email.map(|e| super::resolve_user(&conn, e)).transpose()?;

    match (&user_id, email) {
        (Some(_), Some(email)) => println!(
            "WARNING: This will permanently delete all memories, vault entries, \
             personality and profile of {email}."
        ),
        _ => println!(
            "WARNING: This will permanently delete ALL accounts, memories, vault entries, \
             personalities and audit logs."
        ),
    }
    println!("Database: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    match user_id {
        Some(user_id) => {
            // FTS and vector rows are keyed by the memory, so clear them first.
            conn.execute(
                "INSERT INTO memories_fts(memories_fts, rowid, title, content, id, user_id)
                 SELECT 'delete', rowid, title, content, id, user_id FROM memories WHERE user_id = ?1",
                [&user_id],
            )?;
            conn.execute(
                "DELETE FROM memories_vec WHERE id IN (SELECT id FROM memories WHERE user_id = ?1)",
                [&user_id],
            )?;
            for table in ["memories", "vault_entries", "memory_log"] {
                conn.execute(&format!("DELETE FROM {table} WHERE user_id = ?1"), [&user_id])?;
            }
            conn.execute("DELETE FROM personalities WHERE user_id = ?1", [&user_id])?;
            conn.execute("DELETE FROM users WHERE id = ?1", [&user_id])?;
            println!("All data for this account deleted.");
        }
        None => {
            conn.execute_batch(
                "DELETE FROM memory_log;
                 INSERT INTO memories_fts(memories_fts) VALUES('delete-all');
                 DELETE FROM memories_vec;
                 DELETE FROM memories;
                 DELETE FROM vault_entries;
                 DELETE FROM personalities;
                 DELETE FROM users;",
            )?;
            println!("All data deleted. Database reset complete.");
        }
    }

    Ok(())
}
