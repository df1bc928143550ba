//! Connection readiness checks run by repository constructors.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::error::{ConfigurationError, StoreError, StoreResult};
use rusqlite::Connection;

/// A table and the columns a repository reads or writes in it.
pub(crate) type TableRequirement = (&'static str, &'static [&'static str]);

/// Fails with a configuration error unless `conn` is migrated to the latest
/// schema and carries every required table and column.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    requirements: &[TableRequirement],
) -> StoreResult<()> {
    let actual_version = current_user_version(conn).map_err(db_error)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(ConfigurationError::UninitializedConnection {
            expected_version,
            actual_version,
        }
        .into());
    }

    for &(table, columns) in requirements {
        if !table_exists(conn, table)? {
            return Err(ConfigurationError::MissingRequiredTable(table).into());
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(ConfigurationError::MissingRequiredColumn { table, column }.into());
            }
        }
    }

    Ok(())
}

fn db_error(err: DbError) -> StoreError {
    match err {
        DbError::Sqlite(err) => StoreError::Execution(err),
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => ConfigurationError::UninitializedConnection {
            expected_version: latest_supported,
            actual_version: db_version,
        }
        .into(),
    }
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
