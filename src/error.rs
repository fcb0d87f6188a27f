//! Unified error handling for the directory library.
//!
//! Every fallible operation returns [`DirectoryError`] so callers (the HTTP
//! layer, tests, embedding applications) can match on one type and map it to
//! whatever surface they expose.

use thiserror::Error;

/// Unified error type for directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Requested entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A payload references an entity that does not exist.
    #[error("{entity} {id} does not exist")]
    MissingReference { entity: &'static str, id: i64 },

    /// Phone number failed validation.
    #[error("invalid phone {phone:?}: expected 10 or 11 digits")]
    InvalidPhone { phone: String },

    /// Bounding box with min > max on either axis.
    #[error("invalid bounding box: min bound exceeds max bound")]
    InvalidBounds,

    /// Search radius outside the accepted range.
    #[error("invalid search radius {radius_m} m: must be > 0 and <= {max_m} m")]
    InvalidRadius { radius_m: f64, max_m: f64 },

    /// Malformed input that is not covered by a more specific variant.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying SQLite error.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Schema migration failure on open.
    #[error("migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    /// Generic internal error (poisoned lock, broken invariant).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;
