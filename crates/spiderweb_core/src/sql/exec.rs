//! Execution helpers for rendered statements.
//!
//! # Responsibility
//! - Prepare, bind and run a `BuiltStatement` on a borrowed connection.
//! - Turn "no row" into a typed `NotFound` carrying the looked-up identifier.
//!
//! # Invariants
//! - Statement failures surface unchanged as `StoreError::Execution`.
//! - Log lines carry statement kind and duration only, never bound values.

use crate::error::{StoreError, StoreResult};
use crate::sql::builder::BuiltStatement;
use log::{debug, error};
use rusqlite::{params_from_iter, Connection, Row, Rows};
use std::time::Instant;

/// Maps the first row of `rows` with `map`.
///
/// A query error is propagated as-is. An empty result fails with
/// `NotFound(candidate_id)`. Rows after the first are ignored: this is
/// at-most-one-row read semantics, not an integrity check.
pub fn fetch_single_row<T, F>(
    candidate_id: &str,
    rows: rusqlite::Result<Rows<'_>>,
    map: F,
) -> StoreResult<T>
where
    F: FnOnce(&Row<'_>) -> StoreResult<T>,
{
    let mut rows = rows?;
    match rows.next()? {
        Some(row) => map(row),
        None => Err(StoreError::not_found(candidate_id)),
    }
}

/// Runs a SELECT and maps its first row; see `fetch_single_row`.
pub fn query_single_row<T, F>(
    conn: &Connection,
    statement: &BuiltStatement,
    candidate_id: &str,
    map: F,
) -> StoreResult<T>
where
    F: FnOnce(&Row<'_>) -> StoreResult<T>,
{
    let started_at = Instant::now();
    let result = (|| -> StoreResult<T> {
        let mut stmt = conn.prepare(&statement.sql)?;
        let rows = stmt.query(params_from_iter(statement.params.iter()));
        fetch_single_row(candidate_id, rows, map)
    })();
    if matches!(result, Err(StoreError::NotFound { .. })) {
        debug!(
            "event=sql_exec module=sql status=not_found kind=select_one duration_ms={}",
            started_at.elapsed().as_millis()
        );
    } else {
        log_outcome("select_one", started_at, &result);
    }
    result
}

/// Runs a SELECT and maps every row in order.
pub fn query_all_rows<T, F>(
    conn: &Connection,
    statement: &BuiltStatement,
    mut map: F,
) -> StoreResult<Vec<T>>
where
    F: FnMut(&Row<'_>) -> StoreResult<T>,
{
    let started_at = Instant::now();
    let result = (|| -> StoreResult<Vec<T>> {
        let mut stmt = conn.prepare(&statement.sql)?;
        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
        let mut mapped = Vec::new();
        while let Some(row) = rows.next()? {
            mapped.push(map(row)?);
        }
        Ok(mapped)
    })();
    log_outcome("select_all", started_at, &result);
    result
}

/// Runs an INSERT and returns the generated row id.
pub fn exec_insert(conn: &Connection, statement: &BuiltStatement) -> StoreResult<i64> {
    let started_at = Instant::now();
    let result = execute(conn, statement).map(|_| conn.last_insert_rowid());
    log_outcome("insert", started_at, &result);
    result
}

pub fn exec_update(conn: &Connection, statement: &BuiltStatement) -> StoreResult<()> {
    let started_at = Instant::now();
    let result = execute(conn, statement);
    log_outcome("update", started_at, &result);
    result
}

pub fn exec_batch_insert(conn: &Connection, statement: &BuiltStatement) -> StoreResult<()> {
    let started_at = Instant::now();
    let result = execute(conn, statement);
    log_outcome("batch_insert", started_at, &result);
    result
}

pub fn exec_delete(conn: &Connection, statement: &BuiltStatement) -> StoreResult<()> {
    let started_at = Instant::now();
    let result = execute(conn, statement);
    log_outcome("delete", started_at, &result);
    result
}

fn execute(conn: &Connection, statement: &BuiltStatement) -> StoreResult<()> {
    conn.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
    Ok(())
}

fn log_outcome<T>(kind: &str, started_at: Instant, result: &StoreResult<T>) {
    match result {
        Ok(_) => debug!(
            "event=sql_exec module=sql status=ok kind={} duration_ms={}",
            kind,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=sql_exec module=sql status=error kind={} duration_ms={} error_code={} error={}",
            kind,
            started_at.elapsed().as_millis(),
            err.kind().as_str(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        exec_batch_insert, exec_delete, exec_insert, exec_update, fetch_single_row,
        query_all_rows, query_single_row,
    };
    use crate::error::{ErrorKind, StoreError};
    use crate::sql::builder::{
        build_batch_insert, build_delete, build_insert, build_select, build_update,
        BatchColumnValues, BatchInsertStatement, ColumnValues, DeleteStatement, InsertStatement,
        OrderClause, SelectStatement, UpdateStatement, WhereClause, WhereOperation,
    };
    use rusqlite::types::Value;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Item (
                ID INTEGER PRIMARY KEY AUTOINCREMENT,
                guid TEXT NOT NULL UNIQUE,
                label TEXT
            );",
        )
        .unwrap();
        conn
    }

    fn insert_item(conn: &Connection, guid: &str, label: &str) -> i64 {
        let built = build_insert(&InsertStatement {
            into: "Item".to_string(),
            values: ColumnValues::new()
                .with("guid", guid.to_string())
                .with("label", label.to_string()),
        });
        exec_insert(conn, &built).unwrap()
    }

    fn select_label(guid: &str) -> crate::sql::BuiltStatement {
        build_select(
            &SelectStatement::new(["Item.label"], "Item")
                .filter(WhereClause::all(vec![WhereOperation::new("guid", "= ?")])),
            vec![Value::Text(guid.to_string())],
        )
    }

    #[test]
    fn exec_insert_returns_generated_row_id() {
        let conn = setup();
        assert_eq!(insert_item(&conn, "IT_1", "one"), 1);
        assert_eq!(insert_item(&conn, "IT_2", "two"), 2);
    }

    #[test]
    fn single_row_fetch_maps_first_row() {
        let conn = setup();
        insert_item(&conn, "IT_1", "one");

        let label: String =
            query_single_row(&conn, &select_label("IT_1"), "IT_1", |row| Ok(row.get(0)?))
                .unwrap();
        assert_eq!(label, "one");
    }

    #[test]
    fn single_row_fetch_reports_not_found_with_candidate() {
        let conn = setup();
        let err = query_single_row(&conn, &select_label("IT_404"), "IT_404", |row| {
            Ok(row.get::<_, String>(0)?)
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref id } if id == "IT_404"));
    }

    #[test]
    fn single_row_fetch_discards_extra_rows() {
        let conn = setup();
        insert_item(&conn, "IT_1", "one");
        insert_item(&conn, "IT_2", "two");

        let built = build_select(
            &SelectStatement::new(["Item.guid"], "Item").order_by(OrderClause::asc("Item.ID")),
            Vec::new(),
        );
        let guid: String =
            query_single_row(&conn, &built, "any", |row| Ok(row.get(0)?)).unwrap();
        assert_eq!(guid, "IT_1");
    }

    #[test]
    fn fetch_single_row_propagates_query_error_unchanged() {
        let err = fetch_single_row::<(), _>(
            "IT_1",
            Err(rusqlite::Error::InvalidQuery),
            |_| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Execution(rusqlite::Error::InvalidQuery)
        ));
    }

    #[test]
    fn update_batch_insert_and_delete_round_trip_through_store() {
        let conn = setup();
        insert_item(&conn, "IT_1", "one");

        let update = build_update(
            &UpdateStatement {
                table: "Item".to_string(),
                values: ColumnValues::new().with("label", "uno".to_string()),
                filter: WhereClause::all(vec![WhereOperation::new("guid", "= ?")]),
            },
            vec![Value::Text("IT_1".to_string())],
        );
        exec_update(&conn, &update).unwrap();

        let batch = build_batch_insert(&BatchInsertStatement {
            into: "Item".to_string(),
            rows: BatchColumnValues::new()
                .with_column(
                    "guid",
                    vec![
                        Value::Text("IT_2".to_string()),
                        Value::Text("IT_3".to_string()),
                    ],
                )
                .with_column(
                    "label",
                    vec![
                        Value::Text("two".to_string()),
                        Value::Text("three".to_string()),
                    ],
                ),
        });
        exec_batch_insert(&conn, &batch).unwrap();

        let delete = build_delete(
            &DeleteStatement {
                from: "Item".to_string(),
                filter: WhereClause::all(vec![WhereOperation::new("guid", "= ?")]),
                ..DeleteStatement::default()
            },
            vec![Value::Text("IT_2".to_string())],
        );
        exec_delete(&conn, &delete).unwrap();

        let all = build_select(
            &SelectStatement::new(["Item.guid", "Item.label"], "Item")
                .order_by(OrderClause::asc("Item.ID")),
            Vec::new(),
        );
        let rows: Vec<(String, String)> =
            query_all_rows(&conn, &all, |row| Ok((row.get(0)?, row.get(1)?))).unwrap();
        assert_eq!(
            rows,
            vec![
                ("IT_1".to_string(), "uno".to_string()),
                ("IT_3".to_string(), "three".to_string()),
            ]
        );
    }

    #[test]
    fn execution_failures_are_classified_as_execution() {
        let conn = setup();
        insert_item(&conn, "IT_1", "one");

        let duplicate = build_insert(&InsertStatement {
            into: "Item".to_string(),
            values: ColumnValues::new().with("guid", "IT_1".to_string()),
        });
        let err = exec_insert(&conn, &duplicate).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }
}
