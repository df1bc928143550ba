//! Fixed-format external identifiers.
//!
//! # Responsibility
//! - Generate `<Prefix>_<alphanumeric suffix>` identifiers of a fixed length.
//! - Validate caller-proposed identifiers against the same format.
//!
//! # Invariants
//! - Prefixes are ASCII alphanumeric and never contain `_`; the separator is
//!   added here.
//! - Generation never checks the store; uniqueness is resolved by
//!   `repo::unique_id`.

use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use thiserror::Error;

/// Number of regenerations attempted after the first collision.
pub const MAX_RETRY_ATTEMPTS: u32 = 5;

/// Identifier format used by pages.
pub const PAGE_ID_FORMAT: IdentifierFormat = IdentifierFormat {
    prefix: "PG",
    length: 15,
};

static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z0-9]+$").expect("alphanumeric pattern is valid"));

/// Rejection reasons for a proposed identifier or its format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("proposed id must be {expected} characters")]
    WrongLength { expected: usize },
    #[error("prefix must be at least one character")]
    EmptyPrefix,
    #[error("prefix '{0}' is not alphanumeric; do not include '_' in the prefix, it is added automatically")]
    PrefixNotAlphanumeric(String),
    #[error("length of {0} is invalid; must be at least 3 for a single-character prefix + '_' + a random character")]
    LengthTooShort(usize),
    #[error("prefix must be at most {max} characters for a length of {length}")]
    PrefixTooLong { max: usize, length: usize },
    #[error("proposed id must start with '{0}_'")]
    MissingPrefix(String),
    #[error("characters after prefix, '{0}_', must be English alphanumeric")]
    SuffixNotAlphanumeric(String),
}

/// Prefix and total length for one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierFormat {
    pub prefix: &'static str,
    pub length: usize,
}

impl IdentifierFormat {
    pub fn generate(&self) -> String {
        generate_identifier(self.prefix, self.length)
    }

    pub fn validate(&self, proposed: &str) -> Result<(), IdentifierError> {
        validate_proposed_identifier(proposed, self.prefix, self.length)
    }
}

/// Generates a pseudorandom identifier `prefix_XXXX` of `total_length`
/// characters.
///
/// When the prefix leaves no room for the separator and one random
/// character, the prefix is returned unmodified.
pub fn generate_identifier(prefix: &str, total_length: usize) -> String {
    let suffix_length = total_length as i64 - prefix.chars().count() as i64 - 1;
    if suffix_length <= 0 {
        return prefix.to_string();
    }

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(suffix_length as usize)
        .map(char::from)
        .collect();
    format!("{prefix}_{suffix}")
}

/// Validates a proposed identifier (possibly empty) and the format itself.
///
/// An empty `proposed` only checks that `prefix`/`total_length` describe a
/// usable format.
pub fn validate_proposed_identifier(
    proposed: &str,
    prefix: &str,
    total_length: usize,
) -> Result<(), IdentifierError> {
    if !proposed.is_empty() && proposed.chars().count() != total_length {
        return Err(IdentifierError::WrongLength {
            expected: total_length,
        });
    }
    if prefix.is_empty() {
        return Err(IdentifierError::EmptyPrefix);
    }
    if !is_alphanumeric(prefix) {
        return Err(IdentifierError::PrefixNotAlphanumeric(prefix.to_string()));
    }
    if total_length < 3 {
        return Err(IdentifierError::LengthTooShort(total_length));
    }
    let prefix_length = prefix.chars().count();
    if prefix_length + 2 > total_length {
        return Err(IdentifierError::PrefixTooLong {
            max: total_length - 2,
            length: total_length,
        });
    }
    if proposed.is_empty() {
        return Ok(());
    }

    let Some(suffix) = proposed.strip_prefix(&format!("{prefix}_")) else {
        return Err(IdentifierError::MissingPrefix(prefix.to_string()));
    };
    if !is_alphanumeric(suffix) {
        return Err(IdentifierError::SuffixNotAlphanumeric(prefix.to_string()));
    }
    Ok(())
}

fn is_alphanumeric(value: &str) -> bool {
    ALPHANUMERIC.is_match(value)
}
