//! Local preference store: UI flags and the mirror of the active session.
//!
//! The backend owns all review state. This database only remembers what the
//! client needs across restarts: the dark-mode and tutorial flags, and which
//! session (with its section list) was last active.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::error::StoreError;
use crate::session::Session;

pub const FLAG_DARK_MODE: &str = "dark_mode";
pub const FLAG_TUTORIAL_SEEN: &str = "tutorial_seen";

/// Opens (or creates) the preference database at `path`, configures WAL
/// mode, and applies schema migrations.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL
/// configuration fails, or schema DDL fails.
pub async fn open_store(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok(())
    })
    .await?;

    Ok(conn)
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Reads a boolean flag. `None` means the flag was never set.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn get_flag(conn: &Connection, name: &str) -> Result<Option<bool>, tokio_rusqlite::Error> {
    let name = name.to_owned();

    conn.call(move |db| {
        let value: Option<String> = db
            .query_row(
                "SELECT value FROM flags WHERE name = ?1",
                rusqlite::params![&name],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value.map(|v| v == "true"))
    })
    .await
}

/// Upserts a boolean flag inside `BEGIN IMMEDIATE`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the write transaction fails.
pub async fn set_flag(conn: &Connection, name: &str, value: bool) -> Result<(), tokio_rusqlite::Error> {
    let name = name.to_owned();
    let value = if value { "true" } else { "false" };

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO flags (name, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name)
             DO UPDATE SET value = excluded.value,
                           updated_at = excluded.updated_at",
            rusqlite::params![&name, value, now_secs()],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Replaces the session mirror with `session`.
///
/// # Errors
///
/// Returns `StoreError` if the section list cannot be encoded or the write
/// transaction fails.
pub async fn save_session(conn: &Connection, session: &Session) -> Result<(), StoreError> {
    let sections = serde_json::to_string(&session.section_names())?;
    let id = session.id.clone();
    let document_name = session.document_name.clone();

    conn.call(move |db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM session_mirror", [])?;
        tx.execute(
            "INSERT INTO session_mirror (id, document_name, sections, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![&id, &document_name, &sections, now_secs()],
        )?;
        tx.commit()?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;
    Ok(())
}

/// Loads the mirrored session, if any.
///
/// # Errors
///
/// Returns `StoreError::Corrupt` if the stored section list is not a JSON
/// array of strings.
pub async fn load_session(conn: &Connection) -> Result<Option<Session>, StoreError> {
    let row: Option<(String, String, String)> = conn
        .call(|db| {
            let row = db
                .query_row(
                    "SELECT id, document_name, sections FROM session_mirror
                     ORDER BY updated_at DESC
                     LIMIT 1",
                    [],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
                )
                .optional()?;
            Ok::<_, rusqlite::Error>(row)
        })
        .await?;

    match row {
        Some((id, document_name, sections)) => {
            let names: Vec<String> = serde_json::from_str(&sections)?;
            Ok(Some(Session::new(id, document_name, names)))
        }
        None => Ok(None),
    }
}

/// Forgets the mirrored session (after a reset).
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the delete fails.
pub async fn clear_session(conn: &Connection) -> Result<(), tokio_rusqlite::Error> {
    conn.call(|db| {
        db.execute("DELETE FROM session_mirror", [])?;
        Ok(())
    })
    .await
}
