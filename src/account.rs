//! E-mail identified accounts.
//!
//! There is no credential store: the password is only checked for shape and is
//! never written anywhere. A user's id is derived from their e-mail address,
//! so the same address always maps to the same memories.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const TIMEZONES: [&str; 6] = ["UTC", "EST", "PST", "GMT", "IST", "CET"];

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("e-mail pattern is a valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Please enter a valid email")]
    InvalidEmail,
    #[error("Passwords don't match")]
    PasswordMismatch,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("Please enter valid email and password")]
    InvalidCredentials,
    #[error("unknown timezone: {0} (expected one of UTC, EST, PST, GMT, IST, CET)")]
    InvalidTimezone(String),
    #[error("invalid birth date {0:?}, expected YYYY-MM-DD")]
    InvalidBirthDate(String),
    #[error("no profile for user {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub timezone: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
    pub last_login: Option<String>,
    pub updated_at: Option<String>,
}

/// Editable profile fields; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub timezone: Option<String>,
    pub bio: Option<String>,
}

/// First 16 hex characters of SHA-256 over the e-mail address.
pub fn generate_user_id(email: &str) -> String {
    let digest = Sha256::digest(email.as_bytes());
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex.truncate(16);
    hex
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Create (or overwrite) the profile for `email`.
pub fn register(
    conn: &Connection,
    email: &str,
    name: &str,
    password: &str,
    confirm_password: &str,
) -> Result<UserProfile, AccountError> {
    if !validate_email(email) {
        return Err(AccountError::InvalidEmail);
    }
    if password != confirm_password {
        return Err(AccountError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::PasswordTooShort);
    }

    let user_id = generate_user_id(email);
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO users (id, email, name, created_at, last_login)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![user_id, email, name, now],
    )?;
    tracing::info!(user = %user_id, "registered account");

    get_profile(conn, &user_id)?.ok_or(AccountError::NotFound(user_id))
}

/// Sign in with an e-mail address. A first login creates a bare profile.
pub fn login(conn: &Connection, email: &str, password: &str) -> Result<UserProfile, AccountError> {
    if !validate_email(email) || password.is_empty() {
        return Err(AccountError::InvalidCredentials);
    }

    let user_id = generate_user_id(email);
    let now = chrono::Utc::now().to_rfc3339();
    let updated = conn.execute(
        "UPDATE users SET last_login = ?2 WHERE id = ?1",
        params![user_id, now],
    )?;
    if updated == 0 {
        conn.execute(
            "INSERT INTO users (id, email, created_at, last_login) VALUES (?1, ?2, ?3, ?3)",
            params![user_id, email, now],
        )?;
        tracing::info!(user = %user_id, "created profile on first login");
    }

    get_profile(conn, &user_id)?.ok_or(AccountError::NotFound(user_id))
}

pub fn get_profile(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>, AccountError> {
    let profile = conn
        .query_row(
            "SELECT id, email, name, birth_date, timezone, bio, created_at, last_login, updated_at
             FROM users WHERE id = ?1",
            params![user_id],
            |row| {
                Ok(UserProfile {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    name: row.get(2)?,
                    birth_date: row.get(3)?,
                    timezone: row.get(4)?,
                    bio: row.get(5)?,
                    created_at: row.get(6)?,
                    last_login: row.get(7)?,
                    updated_at: row.get(8)?,
                })
            },
        )
        .optional()?;
    Ok(profile)
}

pub fn update_profile(
    conn: &Connection,
    user_id: &str,
    update: ProfileUpdate,
) -> Result<UserProfile, AccountError> {
    if let Some(tz) = &update.timezone {
        if !TIMEZONES.contains(&tz.as_str()) {
            return Err(AccountError::InvalidTimezone(tz.clone()));
        }
    }
    if let Some(date) = &update.birth_date {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AccountError::InvalidBirthDate(date.clone()))?;
    }

    let updated = conn.execute(
        "UPDATE users SET
            name = COALESCE(?2, name),
            birth_date = COALESCE(?3, birth_date),
            timezone = COALESCE(?4, timezone),
            bio = COALESCE(?5, bio),
            updated_at = ?6
         WHERE id = ?1",
        params![
            user_id,
            update.name,
            update.birth_date,
            update.timezone,
            update.bio,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    if updated == 0 {
        return Err(AccountError::NotFound(user_id.to_string()));
    }

    get_profile(conn, user_id)?.ok_or_else(|| AccountError::NotFound(user_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_is_stable_sha256_prefix() {
        let id = generate_user_id("ada@example.com");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, generate_user_id("ada@example.com"));
        assert_ne!(id, generate_user_id("bob@example.com"));
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(generate_user_id("abc"), "ba7816bf8f01cfea");
    }

    #[test]
    fn email_pattern_compiles() {
        assert_eq!(LazyLock::force(&EMAIL_RE).as_str(), EMAIL_PATTERN);
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("ada.lovelace+echo@mail.example.org"));
        assert!(!validate_email("ada@localhost"));
        assert!(!validate_email("no-at-sign.com"));
        assert!(!validate_email("ada@example.c"));
        assert!(!validate_email(""));
    }

    #[test]
    fn register_checks_in_order() {
        let conn = crate::db::open_memory_database().unwrap();
        // bad e-mail wins over the other problems
        assert!(matches!(
            register(&conn, "nope", "Ada", "abc", "xyz"),
            Err(AccountError::InvalidEmail)
        ));
        assert!(matches!(
            register(&conn, "ada@example.com", "Ada", "abc", "xyz"),
            Err(AccountError::PasswordMismatch)
        ));
        assert!(matches!(
            register(&conn, "ada@example.com", "Ada", "abc", "abc"),
            Err(AccountError::PasswordTooShort)
        ));

        let profile = register(&conn, "ada@example.com", "Ada", "secret1", "secret1").unwrap();
        assert_eq!(profile.id, generate_user_id("ada@example.com"));
        assert_eq!(profile.name.as_deref(), Some("Ada"));
        assert_eq!(profile.last_login.as_deref(), Some(profile.created_at.as_str()));
    }

    #[test]
    fn password_is_not_stored() {
        let conn = crate::db::open_memory_database().unwrap();
        register(&conn, "ada@example.com", "Ada", "hunter22", "hunter22").unwrap();
        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE
                 name LIKE '%hunter22%' OR email LIKE '%hunter22%' OR IFNULL(bio,'') LIKE '%hunter22%'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(hits, 0);
    }

    #[test]
    fn register_overwrites_profile() {
        let conn = crate::db::open_memory_database().unwrap();
        register(&conn, "ada@example.com", "Ada", "secret1", "secret1").unwrap();
        update_profile(
            &conn,
            &generate_user_id("ada@example.com"),
            ProfileUpdate {
                bio: Some("Mathematician".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let again = register(&conn, "ada@example.com", "Countess", "secret2", "secret2").unwrap();
        assert_eq!(again.name.as_deref(), Some("Countess"));
        assert!(again.bio.is_none());
    }

    #[test]
    fn login_creates_minimal_profile() {
        let conn = crate::db::open_memory_database().unwrap();
        assert!(matches!(
            login(&conn, "ada@example.com", ""),
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&conn, "bad", "pw"),
            Err(AccountError::InvalidCredentials)
        ));

        let profile = login(&conn, "ada@example.com", "x").unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert!(profile.name.is_none());
        assert!(profile.last_login.is_some());
    }

    #[test]
    fn login_keeps_existing_profile() {
        let conn = crate::db::open_memory_database().unwrap();
        let registered = register(&conn, "ada@example.com", "Ada", "secret1", "secret1").unwrap();
        let logged_in = login(&conn, "ada@example.com", "whatever").unwrap();
        assert_eq!(logged_in.name.as_deref(), Some("Ada"));
        assert_eq!(logged_in.created_at, registered.created_at);
    }

    #[test]
    fn update_profile_validates_and_merges() {
        let conn = crate::db::open_memory_database().unwrap();
        let user = register(&conn, "ada@example.com", "Ada", "secret1", "secret1").unwrap();

        assert!(matches!(
            update_profile(
                &conn,
                &user.id,
                ProfileUpdate {
                    timezone: Some("MARS".into()),
                    ..Default::default()
                }
            ),
            Err(AccountError::InvalidTimezone(_))
        ));
        assert!(matches!(
            update_profile(
                &conn,
                &user.id,
                ProfileUpdate {
                    birth_date: Some("10/12/1815".into()),
                    ..Default::default()
                }
            ),
            Err(AccountError::InvalidBirthDate(_))
        ));

        let updated = update_profile(
            &conn,
            &user.id,
            ProfileUpdate {
                timezone: Some("GMT".into()),
                birth_date: Some("1815-12-10".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ada"));
        assert_eq!(updated.timezone.as_deref(), Some("GMT"));
        assert_eq!(updated.birth_date.as_deref(), Some("1815-12-10"));
        assert!(updated.updated_at.is_some());

        assert!(matches!(
            update_profile(&conn, "missing", ProfileUpdate::default()),
            Err(AccountError::NotFound(_))
        ));
    }
}
