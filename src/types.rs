//! BucketKV - Core Type Definitions
//! Defines fundamental types used across the store.

use std::fmt;

use crate::error::{BucketKvError, Result};

/// Flat key as stored in the underlying engine.
pub type StorageKey = Vec<u8>;

/// Value type for the store.
/// Values are opaque byte sequences.
pub type Value = Vec<u8>;

/// A validated (bucket, key) pair.
///
/// Construction rejects empty names, so every `RecordId` that reaches the
/// store or the key codec is non-empty in both components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    bucket: String,
    key: String,
}

impl RecordId {
    /// Validate and pair a bucket and key name.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key = key.into();
        validate_bucket(&bucket)?;
        if key.is_empty() {
            return Err(BucketKvError::Validation(
                "key must not be empty".to_string(),
            ));
        }
        Ok(Self { bucket, key })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Reject an empty bucket name.
pub fn validate_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(BucketKvError::Validation(
            "bucket must not be empty".to_string(),
        ));
    }
    Ok(())
}
