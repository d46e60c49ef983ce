use pallet_core::db::migrations::latest_version;
use pallet_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "pallets");
    assert_table_exists(&conn, "pallet_groups");
    assert_table_exists(&conn, "pallet_group_members");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pallets.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "pallets");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

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
fn open_shape_uniqueness_is_enforced_by_the_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO pallets (id, status, shape, created_at) VALUES ('a', 'open', 'star', 1);
         INSERT INTO pallets (id, status, shape, created_at) VALUES ('b', 'closed', 'star', 2);
         INSERT INTO pallets (id, status, shape, created_at) VALUES ('c', 'open', '', 3);
         INSERT INTO pallets (id, status, shape, created_at) VALUES ('d', 'open', '', 4);
         INSERT INTO pallets (id, status, shape, created_at) VALUES ('f', 'open', char(9), 6);
         INSERT INTO pallets (id, status, shape, created_at) VALUES ('g', 'open', char(9), 7);
         INSERT INTO pallets (id, status, shape, created_at)
             VALUES ('h', 'open', ' ' || char(13) || char(10), 8);
         INSERT INTO pallets (id, status, shape, created_at)
             VALUES ('i', 'open', ' ' || char(13) || char(10), 9);",
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO pallets (id, status, shape, created_at) VALUES ('e', 'open', 'star', 5);",
            [],
        )
        .unwrap_err();
    assert!(DbError::from(err).is_constraint_violation());
}

#[test]
fn upgrading_from_version_two_relaxes_index_for_control_whitespace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v2.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(concat!(
        include_str!("../src/db/migrations/0001_pallets.sql"),
        include_str!("../src/db/migrations/0002_pallet_groups.sql"),
        "PRAGMA user_version = 2;"
    ))
    .unwrap();
    conn.execute_batch(
        "INSERT INTO pallets (id, status, shape, created_at) VALUES ('a', 'open', char(9), 1);",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    conn.execute(
        "INSERT INTO pallets (id, status, shape, created_at) VALUES ('b', 'open', char(9), 2);",
        [],
    )
    .unwrap();
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
