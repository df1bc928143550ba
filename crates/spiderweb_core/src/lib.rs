//! Core storage and domain logic for Spiderweb pages.
//!
//! Statements are described declaratively (`sql::builder`), executed through
//! `sql::exec`, and consumed by the page and reference repositories.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod ident;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sql;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use error::{ConfigurationError, ErrorKind, StoreError, StoreResult};
pub use ident::{
    generate_identifier, validate_proposed_identifier, IdentifierError, IdentifierFormat,
    MAX_RETRY_ATTEMPTS, PAGE_ID_FORMAT,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    AppUser, Page, PageBatch, PageDetail, PagePatch, PageProperty, PageTemplate, Partition,
    PartitionType, PermissionType, PropertyType, PropertyValue, Version,
};
pub use repo::page_repo::{PageRepository, SqlitePageRepository};
pub use repo::reference_repo::{ReferenceRepository, SqliteReferenceRepository};
pub use repo::unique_id::{resolve_unique_identifier, IdentifierLookup};
pub use service::page_service::{
    CreatePageRequest, PageService, UpdatePageRequest, PAGE_BATCH_SIZE,
};

/// Minimal liveness API for integration smoke checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
