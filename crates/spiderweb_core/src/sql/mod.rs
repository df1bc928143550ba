//! Parameterized statement construction and execution.
//!
//! # Responsibility
//! - Render declarative statement descriptors to SQL text plus bound values.
//! - Execute rendered statements against a SQLite connection.
//!
//! # Invariants
//! - Values are always bound positionally, never interpolated into text.
//! - Table names are rendered verbatim; they must come from code, not input.

pub mod builder;
pub mod exec;

pub use builder::{
    build_batch_insert, build_delete, build_insert, build_select, build_update, value_stub_list,
    BatchColumnValues, BatchInsertStatement, BuiltStatement, ColumnValues, Combinator,
    DeleteStatement, InsertStatement, JoinClause, OnCondition, OrderClause, SelectStatement,
    SortDirection, UpdateStatement, WhereClause, WhereOperation,
};
pub use exec::{
    exec_batch_insert, exec_delete, exec_insert, exec_update, fetch_single_row, query_all_rows,
    query_single_row,
};
