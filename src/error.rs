//! BucketKV - Custom Error Types
//! Defines the error hierarchy shared by the store, the engine adapter and startup.

use thiserror::Error;

/// Custom Result type for BucketKV.
pub type Result<T> = std::result::Result<T, BucketKvError>;

/// Error types for the bucket store.
#[derive(Error, Debug)]
pub enum BucketKvError {
    /// I/O errors from the data directory or the listening socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by the underlying storage engine.
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    /// The engine handle was already closed.
    #[error("Storage engine is closed")]
    Closed,

    /// A storage key that the key codec could not have produced.
    #[error("Data corruption detected: {0}")]
    Corruption(String),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Empty or otherwise unusable bucket or key name.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Key not found in the requested bucket.
    #[error("Key not found")]
    NotFound,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure outside the store itself (e.g. a worker task that died).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BucketKvError {
    /// Returns true for failures that originate in the engine rather than the caller.
    pub fn is_server_side(&self) -> bool {
        !matches!(self, Self::Validation(_) | Self::NotFound)
    }
}

macro_rules! storage_error_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for BucketKvError {
                fn from(err: $source) -> Self {
                    Self::Storage(redb::Error::from(err))
                }
            }
        )+
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
