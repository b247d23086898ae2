//! # Domain Errors
//!
//! Error types for the suppression gate.
//!
//! The taxonomy is deliberately small:
//!
//! - `Validation`: malformed input, the caller fixes it. Never retried.
//! - `NotFound`: unknown list id. CRUD surfaces this as `Option`/`bool`;
//!   the API dispatcher turns those into this variant.
//! - `InternalInconsistency`: index and store disagree. Fatal to the
//!   operation; the registry rebuilds the index before returning it.
//!
//! Looking up an unknown identifier is NOT an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the suppression store, index and checker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuppressionError {
    /// A required field is missing or empty.
    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },

    /// No suppression list with this id.
    #[error("Suppression list not found: {id}")]
    NotFound { id: String },

    /// The index disagreed with the store and was rebuilt.
    #[error("Index inconsistency detected: {detail}")]
    InternalInconsistency { detail: String },
}

impl SuppressionError {
    /// Shorthand for a missing or empty field.
    pub fn missing(field: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: "is required and must not be empty".to_string(),
        }
    }

    pub fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Validation failure with a custom reason.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the serializable error kind.
    pub fn kind(&self) -> SuppressionErrorKind {
        match self {
            Self::Validation { .. } => SuppressionErrorKind::Validation,
            Self::NotFound { .. } => SuppressionErrorKind::NotFound,
            Self::InternalInconsistency { .. } => SuppressionErrorKind::InternalInconsistency,
        }
    }
}

/// Error kind enumeration for API serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionErrorKind {
    Validation,
    NotFound,
    InternalInconsistency,
}

/// Errors from bulk loaders (suppression list files, banner config).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] SuppressionError),
}
