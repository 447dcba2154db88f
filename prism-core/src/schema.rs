/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 preference schema.
///
/// - `flags`: named boolean UI preferences (`dark_mode`, `tutorial_seen`),
///   stored as `'true'` / `'false'` text.
/// - `session_mirror`: the last active session, so a restart can resume it.
///   Holds at most one row; `sections` is a JSON array of section names.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS flags (
        name        TEXT    PRIMARY KEY,
        value       TEXT    NOT NULL CHECK(value IN ('true', 'false')),
        updated_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS session_mirror (
        id            TEXT    PRIMARY KEY,
        document_name TEXT    NOT NULL,
        sections      TEXT    NOT NULL DEFAULT '[]',
        updated_at    INTEGER NOT NULL
    ) STRICT;
";

/// Runs forward-only schema migration to the latest version.
///
/// Idempotent: safe to call on every startup.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
