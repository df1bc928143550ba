//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep statement construction and execution behind those contracts.
//!
//! # Invariants
//! - Constructors reject connections that are not migrated to the latest
//!   schema with a configuration error.
//! - Repository APIs return semantic errors (`NotFound`, `NotAuthorized`,
//!   `Conflict`) in addition to execution failures.

pub mod page_repo;
pub mod reference_repo;
mod schema;
pub mod unique_id;
