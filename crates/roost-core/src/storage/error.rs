//! Storage error handling
//!
//! Typed errors for the durable store and the legacy blob importer. Parse
//! failures in the legacy blob are deliberately not represented here: a blob
//! that cannot be read is treated as absent, not as an error.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The legacy blob was migrated but could not be removed
    #[error("Failed to remove legacy store '{path}': {source}")]
    DeleteBlob {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
