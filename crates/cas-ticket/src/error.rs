//! Ticket store error types.

use thiserror::Error;

/// Ticket store backend failures.
///
/// A missing record is never an error; lookups report it as `Ok(None)` and
/// deletes of absent records succeed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection to the store backend failed.
    #[error("ticket store connection error: {0}")]
    Connection(String),

    /// A stored record could not be encoded or decoded.
    #[error("ticket store serialization error: {0}")]
    Serialization(String),

    /// The backend did not answer in time.
    #[error("ticket store operation timed out")]
    Timeout,

    /// Invalid store configuration.
    #[error("ticket store configuration error: {0}")]
    Configuration(String),

    /// Any other backend failure.
    #[error("ticket store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns whether the backend could not be reached at all.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}

/// Result type for ticket store operations.
pub type StoreResult<T> = Result<T, StoreError>;
