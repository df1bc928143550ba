//! Lookups of versions, page templates and users by external identifier.
//!
//! # Invariants
//! - Soft-deleted rows are invisible to every lookup.
//! - An empty identifier is rejected before any statement runs.

use crate::error::{StoreError, StoreResult};
use crate::model::{AppUser, PageTemplate, Version};
use crate::repo::schema::{ensure_connection_ready, TableRequirement};
use crate::sql::{build_select, query_single_row, SelectStatement, WhereClause, WhereOperation};
use rusqlite::types::Value;
use rusqlite::Connection;

const REQUIRED_TABLES: &[TableRequirement] = &[
    ("Version", &["ID", "guid", "name", "deletedAt"]),
    ("PageTemplate", &["ID", "guid", "name", "deletedAt"]),
    ("User", &["ID", "guid", "email", "deletedAt"]),
];

/// Read access to the records pages reference.
pub trait ReferenceRepository {
    fn get_version(&self, guid: &str) -> StoreResult<Version>;
    fn get_page_template(&self, guid: &str) -> StoreResult<PageTemplate>;
    fn get_user(&self, guid: &str) -> StoreResult<AppUser>;
}

pub struct SqliteReferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReferenceRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    /// Fetches `(ID, guid, <third column>)` of a live row by guid.
    fn lookup(
        &self,
        table: &str,
        third_column: &str,
        guid: &str,
    ) -> StoreResult<(i64, String, String)> {
        if guid.is_empty() {
            return Err(StoreError::validation(format!(
                "must provide an id to look up {table}"
            )));
        }

        let statement = build_select(
            &SelectStatement::new(
                [
                    format!("{table}.ID"),
                    format!("{table}.guid"),
                    format!("{table}.{third_column}"),
                ],
                table,
            )
            .filter(WhereClause::all(vec![
                WhereOperation::new("guid", "= ?"),
                WhereOperation::new("deletedAt", "IS NULL"),
            ]))
            .limit(1),
            vec![Value::Text(guid.to_string())],
        );
        query_single_row(self.conn, &statement, guid, |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
    }
}

impl ReferenceRepository for SqliteReferenceRepository<'_> {
    fn get_version(&self, guid: &str) -> StoreResult<Version> {
        let (id, guid, name) = self.lookup("Version", "name", guid)?;
        Ok(Version { id, guid, name })
    }

    fn get_page_template(&self, guid: &str) -> StoreResult<PageTemplate> {
        let (id, guid, name) = self.lookup("PageTemplate", "name", guid)?;
        Ok(PageTemplate { id, guid, name })
    }

    fn get_user(&self, guid: &str) -> StoreResult<AppUser> {
        let (id, guid, email) = self.lookup("User", "email", guid)?;
        Ok(AppUser { id, guid, email })
    }
}
