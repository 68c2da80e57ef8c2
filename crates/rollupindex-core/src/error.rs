//! Error types for the rollup index stores.

use thiserror::Error;

/// Errors that can occur while writing to or reading from an index store.
///
/// "Not found" is never an error: lookups return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Duplicate key in {table}: {detail}")]
    DuplicateKey { table: String, detail: String },

    #[error("Missing reference from {table}: {detail}")]
    MissingReference { table: String, detail: String },

    #[error("Invalid chain selector '{0}': expected 'l1' or 'l2'")]
    InvalidChain(String),

    #[error("Codec error in {table}: {reason}")]
    Codec { table: String, reason: String },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// Returns `true` if a batch was rejected because a key already exists.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// A stored value in `table` could not be decoded.
    pub fn codec(table: &str, reason: impl std::fmt::Display) -> Self {
        Self::Codec {
            table: table.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn duplicate(table: &str, detail: impl Into<String>) -> Self {
        Self::DuplicateKey {
            table: table.to_string(),
            detail: detail.into(),
        }
    }

    pub fn missing_reference(table: &str, detail: impl Into<String>) -> Self {
        Self::MissingReference {
            table: table.to_string(),
            detail: detail.into(),
        }
    }
}
