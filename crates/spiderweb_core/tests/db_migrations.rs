use rusqlite::Connection;
use spiderweb_core::db::migrations::latest_version;
use spiderweb_core::db::{is_healthy, open_db, open_db_in_memory, DbError};

const PAGE_TABLES: &[&str] = &[
    "User",
    "Version",
    "PageTemplate",
    "Page",
    "PageOwner",
    "Property",
    "PagePropertyOrder",
    "PagePropertyNumber",
    "PagePropertyString",
    "healthcheck",
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in PAGE_TABLES {
        assert_table_exists(&conn, table);
    }
    assert!(is_healthy(&conn).unwrap());
}

#[test]
fn reopening_file_database_keeps_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spiderweb.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO Version (guid, name) VALUES ('VR_1', 'Main');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let versions: i64 = second
        .query_row("SELECT COUNT(*) FROM Version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(versions, 1);
    let health_rows: i64 = second
        .query_row("SELECT COUNT(*) FROM healthcheck;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(health_rows, 1, "seed rows must not be re-applied");
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
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO PageOwner (Page_ID, User_ID, isOwner) VALUES (404, 404, 1);",
        [],
    );
    assert!(result.is_err());
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
