//! BucketKV - Key Codec
//! Maps a (bucket, key) pair onto a single flat storage key and back.
//!
//! ## Layout
//! ```text
//! [escaped bucket][0x00][raw key bytes]
//! ```
//! The bucket is escaped so it never contains the `0x00` terminator:
//!
//! - `0x00` → `0x01 0x01`
//! - `0x01` → `0x01 0x02`
//! - all other bytes unchanged
//!
//! The first `0x00` therefore always ends the bucket, whatever bytes the bucket
//! or the key contain, and `escape(bucket) ++ 0x00` is a prefix of exactly that
//! bucket's storage keys. The escaping preserves byte order, so buckets sort
//! lexicographically and keys sort by their raw bytes within a bucket.

use bytes::BufMut;

use crate::error::{BucketKvError, Result};
use crate::types::StorageKey;

/// Ends the bucket component (lowest byte value).
const TERMINATOR_BYTE: u8 = 0x00;

/// Introduces a two-byte escape sequence inside the bucket component.
const ESCAPE_BYTE: u8 = 0x01;

/// Encode a (bucket, key) pair into its storage key.
pub fn encode(bucket: &str, key: &str) -> StorageKey {
    let mut buf = Vec::with_capacity(bucket.len() + key.len() + 2);
    put_bucket(bucket, &mut buf);
    buf.put_slice(key.as_bytes());
    buf
}

/// The prefix shared by every storage key in `bucket` and by no other bucket.
pub fn bucket_prefix(bucket: &str) -> StorageKey {
    let mut buf = Vec::with_capacity(bucket.len() + 1);
    put_bucket(bucket, &mut buf);
    buf
}

fn put_bucket(bucket: &str, buf: &mut Vec<u8>) {
    for &byte in bucket.as_bytes() {
        match byte {
            TERMINATOR_BYTE => {
                buf.put_u8(ESCAPE_BYTE);
                buf.put_u8(0x01);
            }
            ESCAPE_BYTE => {
                buf.put_u8(ESCAPE_BYTE);
                buf.put_u8(0x02);
            }
            _ => buf.put_u8(byte),
        }
    }
    buf.put_u8(TERMINATOR_BYTE);
}

/// Decode a storage key back into its (bucket, key) pair.
pub fn decode(storage_key: &[u8]) -> Result<(String, String)> {
    let (bucket, rest) = split_bucket(storage_key)?;
    Ok((bucket, utf8(rest.to_vec(), "key")?))
}

/// Decode only the bucket component of a storage key.
pub fn decode_bucket(storage_key: &[u8]) -> Result<String> {
    split_bucket(storage_key).map(|(bucket, _)| bucket)
}

/// Decode the key component of a storage key already known to start with `prefix`.
pub fn decode_key_in(prefix: &[u8], storage_key: &[u8]) -> Result<String> {
    let rest = storage_key.strip_prefix(prefix).ok_or_else(|| {
        BucketKvError::Corruption("storage key outside of the scanned bucket".to_string())
    })?;
    utf8(rest.to_vec(), "key")
}

fn split_bucket(storage_key: &[u8]) -> Result<(String, &[u8])> {
    let mut bucket = Vec::new();
    let mut i = 0;

    while i < storage_key.len() {
        match storage_key[i] {
            TERMINATOR_BYTE => {
                return Ok((utf8(bucket, "bucket")?, &storage_key[i + 1..]));
            }
            ESCAPE_BYTE => {
                let next = storage_key.get(i + 1).ok_or_else(|| {
                    BucketKvError::Corruption("truncated escape sequence in bucket".to_string())
                })?;
                match next {
                    0x01 => bucket.push(TERMINATOR_BYTE),
                    0x02 => bucket.push(ESCAPE_BYTE),
                    other => {
                        return Err(BucketKvError::Corruption(format!(
                            "invalid escape sequence: 0x01 0x{other:02x}"
                        )));
                    }
                }
                i += 2;
            }
            byte => {
                bucket.push(byte);
                i += 1;
            }
        }
    }

    Err(BucketKvError::Corruption(
        "storage key has no bucket terminator".to_string(),
    ))
}

fn utf8(bytes: Vec<u8>, what: &str) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| BucketKvError::Corruption(format!("{what} is not valid UTF-8: {e}")))
}
