use folio_core::db::migrations::{apply_migrations, current_user_version, latest_version};
use folio_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "articles");
    assert_table_exists(&conn, "posts");
}

#[test]
fn opening_same_database_twice_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO posts (id, title, body, user_id, created_at)
             VALUES ('00000000-0000-4000-8000-000000000001', 't', 'b', 'u', 1);",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM posts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_empty_titles_at_the_storage_level() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute(
            "INSERT INTO articles (id, title, body, author_id, created_at)
             VALUES ('00000000-0000-4000-8000-000000000002', '', 'b', 'u', 1);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
}

#[test]
fn apply_reports_upgrade_range_and_is_noop_when_current() {
    let mut conn = Connection::open_in_memory().unwrap();
    let upgrade = apply_migrations(&mut conn).unwrap();
    assert_eq!(upgrade.from, 0);
    assert_eq!(upgrade.to, latest_version());

    let again = apply_migrations(&mut conn).unwrap();
    assert!(again.is_noop());
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
}

#[test]
fn failed_step_names_the_migration_and_keeps_previous_version() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_articles.sql"))
        .unwrap();
    // A legacy `posts` table without `created_at` breaks the posts index.
    conn.execute_batch("CREATE TABLE posts (id TEXT); PRAGMA user_version = 1;")
        .unwrap();

    match apply_migrations(&mut conn).unwrap_err() {
        DbError::Migration { version, name, .. } => {
            assert_eq!(version, 2);
            assert_eq!(name, "posts");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(current_user_version(&conn).unwrap(), 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
