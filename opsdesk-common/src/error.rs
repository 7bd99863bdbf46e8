//! Shared error type for the OpsDesk services.
//!
//! Domain-shaped failures (`NotFound`, `InvalidInput`) come first so
//! callers matching on them read naturally; infrastructure wrappers
//! follow. Services layer their own API error types on top of this one.

use thiserror::Error;

/// Common result type for OpsDesk operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A record or catalog row the caller asked for does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Out-of-contract input: malformed blob, empty sample set, ragged rows
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Root-folder resolution or config file parsing failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Datastore failure (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything that should not happen given intact invariants
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this is SQLite reporting lock contention.
    ///
    /// Write paths that want to retry instead of failing check this;
    /// every other error class propagates immediately.
    #[cfg(feature = "sqlx")]
    pub fn is_locked(&self) -> bool {
        matches!(self, Error::Database(e) if e.to_string().contains("database is locked"))
    }
}
