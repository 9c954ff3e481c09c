//! Memory subsystem errors.

use thiserror::Error;

/// Errors from the memory index and store.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Failed to check out a pooled connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// SQLite-level failure.
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// Filesystem failure while setting up the store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
