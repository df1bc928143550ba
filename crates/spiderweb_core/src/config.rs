//! Process configuration read from the environment.
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed ones are errors.
//! - `log_dir`, when set, is absolute.

use crate::logging::{default_log_level, normalize_level};
use std::path::PathBuf;
use thiserror::Error;

pub const DB_PATH_VAR: &str = "SPIDERWEB_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "SPIDERWEB_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "SPIDERWEB_LOG_DIR";
pub const DEFAULT_DB_PATH: &str = "spiderweb.db";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: unsupported log level `{value}`; expected trace|debug|info|warn|error")]
    InvalidLogLevel { var: &'static str, value: String },
    #[error("{var}: log directory must be an absolute path, got `{value}`")]
    RelativeLogDir { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(DB_PATH_VAR) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_VAR) {
            config.log_level =
                normalize_level(&level).map_err(|_| ConfigError::InvalidLogLevel {
                    var: LOG_LEVEL_VAR,
                    value: level.clone(),
                })?;
        }
        if let Some(dir) = read(LOG_DIR_VAR) {
            let path = PathBuf::from(&dir);
            if !path.is_absolute() {
                return Err(ConfigError::RelativeLogDir {
                    var: LOG_DIR_VAR,
                    value: dir,
                });
            }
            config.log_dir = Some(path);
        }

        Ok(config)
    }
}
