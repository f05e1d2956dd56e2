//! Error types shared across the crate.
//!
//! Validation failures (normalization, dates) are recoverable and surface to
//! the caller. Estimation itself never fails; degraded estimates are reported
//! through [`crate::estimation::Confidence::Fallback`] instead.

use std::path::PathBuf;

use crate::features::Field;

/// A raw attribute could not be mapped onto its closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized {field}: {raw_value:?}")]
pub struct NormalizationError {
    /// Which attribute was rejected.
    pub field: Field,
    /// The value exactly as the caller supplied it.
    pub raw_value: String,
}

/// An order date was malformed or fell outside the supported calendar range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid order date {raw:?}: {reason}")]
pub struct InvalidDateError {
    pub raw: String,
    pub reason: String,
}

/// Errors returned by the prediction call surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    InvalidDate(#[from] InvalidDateError),
}

/// Errors loading or validating reference data.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed reference data: {0}")]
    Json(#[source] serde_json::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors from the file-backed stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record at {path}:{line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the credential collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email and password are both required")]
    MissingCredentials,

    #[error("An account already exists for {0}")]
    AlreadyRegistered(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from placing an order.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("Failed to record order: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PredictionError>;
