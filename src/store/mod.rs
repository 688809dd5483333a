//! BucketKV - Namespaced Store
//! Partitions the engine's flat keyspace into buckets through the key codec.
//!
//! A bucket has no record of its own: it exists exactly while at least one key is
//! stored under its prefix. Every operation runs in its own engine transaction, so
//! each is atomic for the single record it touches; nothing spans several calls.

pub mod metrics;

use std::ops::ControlFlow;

use crate::codec;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{BucketKvError, Result};
use crate::types::{RecordId, Value};

use self::metrics::StoreMetrics;

/// Bucket-scoped key-value store over a shared [`Engine`].
///
/// `Store` is `Sync`; share it as `Arc<Store>` between request workers.
pub struct Store {
    engine: Engine,
    metrics: StoreMetrics,
}

impl Store {
    /// Open the engine described by `config` and wrap it.
    pub fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(Engine::open(config)?))
    }

    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            metrics: StoreMetrics::new(),
        }
    }

    /// Store `value` under `id`, replacing any previous value.
    pub fn set(&self, id: &RecordId, value: &[u8]) -> Result<()> {
        let storage_key = codec::encode(id.bucket(), id.key());
        let replaced = self
            .observe(self.engine.write(|scope| scope.put(&storage_key, value)))?;

        self.metrics.record_set(value.len());
        log::debug!("set {} ({} bytes, replaced={})", id, value.len(), replaced);
        Ok(())
    }

    /// Fetch the value stored under `id`.
    ///
    /// Absence is reported as [`BucketKvError::NotFound`].
    pub fn get(&self, id: &RecordId) -> Result<Value> {
        let storage_key = codec::encode(id.bucket(), id.key());
        let value = self.observe(self.engine.read(|scope| scope.get(&storage_key)))?;

        self.metrics.record_get(value.as_ref().map(Vec::len));
        value.ok_or(BucketKvError::NotFound)
    }

    /// Remove `id`. Removing an absent key succeeds.
    pub fn delete(&self, id: &RecordId) -> Result<()> {
        let storage_key = codec::encode(id.bucket(), id.key());
        let existed = self.observe(self.engine.write(|scope| scope.delete(&storage_key)))?;

        self.metrics.record_delete();
        log::debug!("delete {} (existed={})", id, existed);
        Ok(())
    }

    /// Names of all buckets holding at least one key, ascending.
    ///
    /// Walks every record in the store: O(total records), not O(buckets).
    pub fn list_buckets(&self) -> Result<Vec<String>> {
        let buckets = self.observe(self.engine.read(|scope| {
            let mut buckets: Vec<String> = Vec::new();
            scope.scan(&[], |storage_key, _| {
                let bucket = codec::decode_bucket(storage_key)?;
                // The scan is ordered, so equal buckets are adjacent.
                if buckets.last() != Some(&bucket) {
                    buckets.push(bucket);
                }
                Ok(ControlFlow::Continue(()))
            })?;
            Ok(buckets)
        }))?;

        self.metrics.record_list();
        Ok(buckets)
    }

    /// Keys stored in `bucket`, in ascending byte order. An unknown bucket is empty.
    pub fn list_keys(&self, bucket: &str) -> Result<Vec<String>> {
        let prefix = codec::bucket_prefix(bucket);
        let keys = self.observe(self.engine.read(|scope| {
            let mut keys = Vec::new();
            scope.scan(&prefix, |storage_key, _| {
                keys.push(codec::decode_key_in(&prefix, storage_key)?);
                Ok(ControlFlow::Continue(()))
            })?;
            Ok(keys)
        }))?;

        self.metrics.record_list();
        Ok(keys)
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Close the underlying engine. Idempotent.
    pub fn close(&self) {
        self.engine.close();
    }

    fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_server_side() {
                self.metrics.record_storage_error();
            }
        }
        result
    }
}
