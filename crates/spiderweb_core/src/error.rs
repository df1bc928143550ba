//! Store error taxonomy shared by repositories and services.
//!
//! # Responsibility
//! - Provide one tagged error type for every store-facing operation.
//! - Expose an explicit `ErrorKind` discriminant so callers (handlers, CLI)
//!   can map failures to transport codes without inspecting messages.
//!
//! # Invariants
//! - Validation and configuration errors are raised before any statement runs.
//! - `Execution` wraps the underlying SQLite failure unchanged.

use crate::ident::IdentifierError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse classification of a `StoreError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    Authorization,
    Conflict,
    RetryExhausted,
    Execution,
}

impl ErrorKind {
    /// Stable snake_case code used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Authorization => "authorization",
            Self::Conflict => "conflict",
            Self::RetryExhausted => "retry_exhausted",
            Self::Execution => "execution",
        }
    }
}

/// Reasons a connection is not usable by a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("repository requires column `{column}` in table `{table}`")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// Error returned by every store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is not configured: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("could not find: {id}")]
    NotFound { id: String },

    #[error("user {user_id} is not authorized to perform the action on {resource_id}")]
    NotAuthorized {
        user_id: String,
        resource_id: String,
    },

    #[error("the proposed id {id} already exists")]
    Conflict { id: String },

    #[error("max number of retries ({attempts}) have been attempted for generating a new id")]
    RetryExhausted { attempts: u32 },

    #[error("statement execution failed: {0}")]
    Execution(#[from] rusqlite::Error),

    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn not_authorized(user_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self::NotAuthorized {
            user_id: user_id.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Returns the taxonomy bucket of this error.
    ///
    /// Persisted data that cannot be decoded is reported as an execution
    /// failure: the statement ran, but its result is unusable.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation(_) | Self::InvalidIdentifier(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotAuthorized { .. } => ErrorKind::Authorization,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            Self::Execution(_) | Self::InvalidData(_) => ErrorKind::Execution,
        }
    }
}
