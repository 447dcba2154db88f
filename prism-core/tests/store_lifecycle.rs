//! Integration test for the preference store.
//!
//! Exercises: open_store, migrate, get_flag / set_flag, save_session,
//! load_session, clear_session, and persistence across reopen.

use prism_core::session::Session;
use prism_core::store;

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("prefs.db");
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn schema_is_migrated_in_wal_mode() {
    let path = temp_db_path();
    let conn = store::open_store(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    // Reopening must not re-apply v1.
    drop(conn);
    let conn = store::open_store(&path).await.unwrap();
    let rows: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT COUNT(*) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn flags_round_trip_and_persist() {
    let path = temp_db_path();
    let conn = store::open_store(&path).await.unwrap();

    assert_eq!(store::get_flag(&conn, store::FLAG_DARK_MODE).await.unwrap(), None);
    store::set_flag(&conn, store::FLAG_DARK_MODE, true).await.unwrap();
    store::set_flag(&conn, store::FLAG_TUTORIAL_SEEN, true).await.unwrap();
    store::set_flag(&conn, store::FLAG_DARK_MODE, false).await.unwrap();
    drop(conn);

    let conn = store::open_store(&path).await.unwrap();
    assert_eq!(
        store::get_flag(&conn, store::FLAG_DARK_MODE).await.unwrap(),
        Some(false)
    );
    assert_eq!(
        store::get_flag(&conn, store::FLAG_TUTORIAL_SEEN).await.unwrap(),
        Some(true)
    );
}

#[tokio::test]
async fn session_mirror_keeps_only_the_latest_session() {
    let path = temp_db_path();
    let conn = store::open_store(&path).await.unwrap();
    assert!(store::load_session(&conn).await.unwrap().is_none());

    let first = Session::new("s1", "a.docx", vec!["Intro".into()]);
    let second = Session::new(
        "s2",
        "b.docx",
        vec!["Summary".into(), "Timeline".into(), "Outcome".into()],
    );
    store::save_session(&conn, &first).await.unwrap();
    store::save_session(&conn, &second).await.unwrap();
    drop(conn);

    let conn = store::open_store(&path).await.unwrap();
    let loaded = store::load_session(&conn).await.unwrap().unwrap();
    assert_eq!(loaded, second);
    assert_eq!(loaded.section_name(2), Some("Outcome"));

    store::clear_session(&conn).await.unwrap();
    assert!(store::load_session(&conn).await.unwrap().is_none());
}

#[tokio::test]
async fn corrupt_section_list_is_reported() {
    let path = temp_db_path();
    let conn = store::open_store(&path).await.unwrap();
    conn.call(|db| {
        db.execute(
            "INSERT INTO session_mirror (id, document_name, sections, updated_at)
             VALUES ('s1', 'a.docx', 'not json', 0)",
            [],
        )?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
    .unwrap();

    let err = store::load_session(&conn).await.unwrap_err();
    assert!(matches!(err, prism_core::error::StoreError::Corrupt(_)));
}
