//! Store liveness probe.

use super::DbResult;
use rusqlite::Connection;

const HEALTHY_STATUS: &str = "ok";

/// Returns whether the `healthcheck` table reports an `ok` row.
///
/// An empty table is unhealthy; a failing query is an error.
pub fn is_healthy(conn: &Connection) -> DbResult<bool> {
    let mut stmt = conn.prepare("SELECT status FROM healthcheck;")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let status: String = row.get(0)?;
        if status == HEALTHY_STATUS {
            return Ok(true);
        }
    }
    Ok(false)
}
