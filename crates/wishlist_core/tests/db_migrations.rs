use rusqlite::Connection;
use wishlist_core::db::migrations::latest_version;
use wishlist_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "wishes");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wishes.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    conn_first
        .execute(
            "INSERT INTO wishes (title, priority) VALUES ('Buch', 3);",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM wishes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_rows_breaking_wish_invariants() {
    let conn = open_db_in_memory().unwrap();

    for sql in [
        "INSERT INTO wishes (title, priority) VALUES ('   ', 3);",
        "INSERT INTO wishes (title, priority) VALUES ('Buch', 6);",
        "INSERT INTO wishes (title, priority, giver) VALUES ('Buch', 3, 'Anna');",
        "INSERT INTO wishes (title, priority, secret) VALUES ('Buch', 3, 'abc');",
    ] {
        assert!(conn.execute(sql, []).is_err(), "accepted: {sql}");
    }
}

#[test]
fn secrets_are_unique_but_empty_secrets_are_not() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO wishes (title, priority) VALUES ('a', 1);
         INSERT INTO wishes (title, priority) VALUES ('b', 1);
         INSERT INTO wishes (title, priority, giver, secret) VALUES ('c', 1, 'Anna', 'x');",
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO wishes (title, priority, giver, secret) VALUES ('d', 1, 'Ben', 'x');",
        [],
    );
    assert!(duplicate.is_err());
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
