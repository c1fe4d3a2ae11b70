//! Storage traits and error types
//!
//! Collection files are treated as opaque blobs addressed by file name.
//! The trait keeps the loader and writer independent of where those blobs live.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {name}: {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for blob storage backends
pub trait Storage {
    /// Reads a blob
    ///
    /// # Returns
    ///
    /// * `Ok(Some(bytes))` - The blob exists
    /// * `Ok(None)` - No blob is stored under `name`
    /// * `Err(StorageError)` - The blob exists but could not be read
    fn read(&self, name: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the blob stored under `name` with `contents`
    fn write(&self, name: &str, contents: &[u8]) -> StorageResult<()>;
}
