//! BucketKV - Bucket-Scoped Key-Value Store
//!
//! A multi-tenant key-value store served over HTTP. Keys live in named buckets,
//! values are opaque bytes, and every request carries a signed bearer token.
//!
//! ## Components
//! - **Key Codec**: escaped, order-preserving `(bucket, key)` → storage key mapping
//! - **Engine**: transactional snapshot reads, atomic writes and prefix scans over redb
//! - **Store**: set/get/delete plus bucket and key listing derived from prefix scans
//! - **Access Gate**: HMAC-signed bearer token verification with clock-skew leeway
//! - **Server**: axum routes wiring the gate in front of the store
//!
//! ## Example
//! ```no_run
//! use bucketkv::{config::{Config, Secret}, store::Store, types::RecordId};
//!
//! let config = Config::new("./data", Secret::new("change-me").unwrap());
//! let store = Store::open(&config).unwrap();
//!
//! let id = RecordId::new("users", "42").unwrap();
//! store.set(&id, &[0xDE, 0xAD]).unwrap();
//! assert_eq!(store.get(&id).unwrap(), vec![0xDE, 0xAD]);
//! assert_eq!(store.list_keys("users").unwrap(), vec!["42"]);
//! ```

pub mod auth;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod store;
pub mod types;

pub use error::{BucketKvError, Result};
