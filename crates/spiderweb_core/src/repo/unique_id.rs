//! Store-verified identifier resolution.
//!
//! # Responsibility
//! - Turn an optional proposed identifier into one that is unused in a table.
//! - Bound regeneration when generated candidates collide.
//!
//! # Invariants
//! - Format validation runs before any lookup.
//! - A proposed identifier is never replaced; a taken one is a `Conflict`.
//! - The check is not atomic with the caller's insert; a lost race surfaces
//!   as the store's uniqueness constraint failure.

use crate::error::{StoreError, StoreResult};
use crate::ident::{generate_identifier, validate_proposed_identifier};
use crate::sql::{build_select, query_all_rows, SelectStatement, WhereClause, WhereOperation};
use log::warn;
use rusqlite::types::Value;
use rusqlite::Connection;

/// Answers whether an identifier is already present in a table.
pub trait IdentifierLookup {
    fn identifier_exists(&self, table: &str, id: &str) -> StoreResult<bool>;
}

impl IdentifierLookup for Connection {
    fn identifier_exists(&self, table: &str, id: &str) -> StoreResult<bool> {
        let statement = build_select(
            &SelectStatement::new([format!("{table}.guid")], table)
                .filter(WhereClause::all(vec![WhereOperation::new("guid", "= ?")]))
                .limit(1),
            vec![Value::Text(id.to_string())],
        );
        let found = query_all_rows(self, &statement, |_| Ok(()))?;
        Ok(!found.is_empty())
    }
}

/// Resolves a unique identifier for `table` using random generation.
///
/// See `resolve_unique_identifier_with` for the resolution rules.
pub fn resolve_unique_identifier<L: IdentifierLookup + ?Sized>(
    lookup: &L,
    table: &str,
    prefix: &str,
    total_length: usize,
    proposed: &str,
    max_retries: u32,
) -> StoreResult<String> {
    resolve_unique_identifier_with(
        lookup,
        table,
        prefix,
        total_length,
        proposed,
        max_retries,
        || generate_identifier(prefix, total_length),
    )
}

/// Resolves a unique identifier, drawing candidates from `generate`.
///
/// - Invalid `proposed` or format ⇒ validation error, no lookup issued.
/// - Non-empty `proposed` ⇒ returned when unused, `Conflict` otherwise.
/// - Empty `proposed` ⇒ up to `1 + max_retries` candidates are tried, then
///   `RetryExhausted`.
pub fn resolve_unique_identifier_with<L, G>(
    lookup: &L,
    table: &str,
    prefix: &str,
    total_length: usize,
    proposed: &str,
    max_retries: u32,
    mut generate: G,
) -> StoreResult<String>
where
    L: IdentifierLookup + ?Sized,
    G: FnMut() -> String,
{
    validate_proposed_identifier(proposed, prefix, total_length)?;

    if !proposed.is_empty() {
        if lookup.identifier_exists(table, proposed)? {
            return Err(StoreError::Conflict {
                id: proposed.to_string(),
            });
        }
        return Ok(proposed.to_string());
    }

    for attempt in 0..=max_retries {
        let candidate = generate();
        if !lookup.identifier_exists(table, &candidate)? {
            return Ok(candidate);
        }
        warn!(
            "event=id_collision module=repo status=retry table={} attempt={}",
            table,
            attempt + 1
        );
    }

    Err(StoreError::RetryExhausted {
        attempts: max_retries,
    })
}
