//! Forward-only schema upgrades, tracked in `schema_meta`.

use rusqlite::{Connection, OptionalExtension};

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Model recorded for databases that predate model tracking.
const LEGACY_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

type Migration = fn(&Connection) -> rusqlite::Result<()>;

/// `(target version, step)` pairs, in order.
const MIGRATIONS: &[(u32, Migration)] = &[(2, record_embedding_model), (3, add_profile_timestamps)];

pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO schema_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}

/// Embedding model the stored vectors were produced with, if recorded.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'embedding_model'",
        [],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    set_meta(conn, "embedding_model", model)
}

/// Bring the database up to [`CURRENT_SCHEMA_VERSION`]. Each step runs in its
/// own transaction together with the version bump.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    for &(target, step) in MIGRATIONS.iter().filter(|(target, _)| *target > version) {
        tracing::info!(to = target, "running migration");
        conn.execute_batch("BEGIN")?;
        let result = step(conn).and_then(|_| set_meta(conn, "schema_version", &target.to_string()));
        match result {
            Ok(()) => conn.execute_batch("COMMIT")?,
            Err(e) => {
                conn.execute_batch("ROLLBACK")?;
                return Err(e);
            }
        }
    }
    Ok(())
}

/// v2: vectors written before model tracking came from the bundled MiniLM.
fn record_embedding_model(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('embedding_model', ?1)",
        [LEGACY_EMBEDDING_MODEL],
    )?;
    Ok(())
}

/// v3: profile editing needs `users.last_login` and `users.updated_at`.
fn add_profile_timestamps(conn: &Connection) -> rusqlite::Result<()> {
    let columns: Vec<String> = conn
        .prepare("SELECT name FROM pragma_table_info('users')")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    for column in ["last_login", "updated_at"] {
        if !columns.iter().any(|c| c == column) {
            conn.execute_batch(&format!("ALTER TABLE users ADD COLUMN {column} TEXT"))?;
        }
    }
    Ok(())
}
