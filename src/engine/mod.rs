//! BucketKV - Storage Engine Adapter
//! Owns the single handle to the ordered on-disk store (redb) and exposes
//! transactional read, write and prefix-scan scopes over one flat table.
//!
//! ## Concurrency Model
//! - **Reads** run against an MVCC snapshot taken when the scope opens; they never
//!   block writers and are never blocked by them
//! - **Writes** are serialized by the engine, commit atomically when the closure
//!   returns `Ok` and are rolled back on `Err` or when the scope is dropped
//! - `close` waits for in-flight scopes, then releases the handle

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use redb::{Database, ReadOnlyTable, ReadableTable, Table, TableDefinition};

use crate::config::Config;
use crate::error::{BucketKvError, Result};
use crate::types::Value;

/// The one table holding every record, keyed by codec-encoded storage keys.
const RECORDS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// Handle to the underlying ordered byte-keyed store.
pub struct Engine {
    db: RwLock<Option<Database>>,
    path: PathBuf,
}

impl Engine {
    /// Open or create the store inside the configured data directory.
    ///
    /// Fails if the directory cannot be created or the database file is unreadable
    /// or corrupt.
    pub fn open(config: &Config) -> Result<Self> {
        config.ensure_dirs()?;
        Self::open_path(config.db_path())
    }

    /// Open or create the store at an explicit database file path.
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let db = Database::create(&path)?;

        // Create the table up front so read transactions never see it missing.
        let txn = db.begin_write()?;
        txn.open_table(RECORDS_TABLE)?;
        txn.commit()?;

        log::info!("Storage engine opened at {:?}", path);

        Ok(Self {
            db: RwLock::new(Some(db)),
            path,
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once `close` has run.
    pub fn is_closed(&self) -> bool {
        self.db
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Run `f` against a consistent read-only snapshot.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadScope) -> Result<T>,
    {
        let guard = self.db.read().unwrap_or_else(PoisonError::into_inner);
        let db = guard.as_ref().ok_or(BucketKvError::Closed)?;

        let txn = db.begin_read()?;
        let scope = ReadScope {
            table: txn.open_table(RECORDS_TABLE)?,
        };
        f(&scope)
    }

    /// Run `f` inside a write transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; otherwise every mutation
    /// made through the scope is discarded.
    pub fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteScope<'_>) -> Result<T>,
    {
        let guard = self.db.read().unwrap_or_else(PoisonError::into_inner);
        let db = guard.as_ref().ok_or(BucketKvError::Closed)?;

        let txn = db.begin_write()?;
        let outcome = {
            let mut scope = WriteScope {
                table: txn.open_table(RECORDS_TABLE)?,
            };
            f(&mut scope)
        };

        match outcome {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    log::warn!("Failed to abort write transaction: {}", abort_err);
                }
                Err(err)
            }
        }
    }

    /// Release the handle. Later calls are no-ops; later operations fail with
    /// [`BucketKvError::Closed`].
    pub fn close(&self) {
        let mut guard = self.db.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            log::info!("Storage engine at {:?} closed", self.path);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.close();
    }
}

/// Read-only view of a snapshot.
pub struct ReadScope {
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl ReadScope {
    /// Point lookup.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.table.get(key)?.map(|value| value.value().to_vec()))
    }

    /// Visit every entry whose key starts with `prefix`, in ascending key order.
    ///
    /// Entries are pulled lazily from the engine; the visitor returns
    /// `ControlFlow::Break` to stop early. An empty prefix visits the whole store.
    pub fn scan<F>(&self, prefix: &[u8], mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<ControlFlow<()>>,
    {
        for entry in self.table.range(prefix..)? {
            let (key, value) = entry?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            if visit(key, value.value())?.is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// Mutable view inside a write transaction.
pub struct WriteScope<'txn> {
    table: Table<'txn, &'static [u8], &'static [u8]>,
}

impl WriteScope<'_> {
    /// Insert or replace; returns true if a previous value existed.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        Ok(self.table.insert(key, value)?.is_some())
    }

    /// Remove; returns true if the key existed.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.table.remove(key)?.is_some())
    }

    /// Point lookup that observes this transaction's own writes.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.table.get(key)?.map(|value| value.value().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_engine() -> (tempfile::TempDir, Engine) {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::open_path(dir.path().join("test.redb")).unwrap();
        (dir, engine)
    }

    fn collect(engine: &Engine, prefix: &[u8]) -> Vec<Vec<u8>> {
        engine
            .read(|scope| {
                let mut keys = Vec::new();
                scope.scan(prefix, |key, _| {
                    keys.push(key.to_vec());
                    Ok(ControlFlow::Continue(()))
                })?;
                Ok(keys)
            })
            .unwrap()
    }

    #[test]
    fn test_put_get_delete() {
        let (_dir, engine) = temp_engine();

        let existed = engine.write(|scope| scope.put(b"k", b"v")).unwrap();
        assert!(!existed);
        assert_eq!(
            engine.read(|scope| scope.get(b"k")).unwrap(),
            Some(b"v".to_vec())
        );

        assert!(engine.write(|scope| scope.delete(b"k")).unwrap());
        assert!(!engine.write(|scope| scope.delete(b"k")).unwrap());
        assert_eq!(engine.read(|scope| scope.get(b"k")).unwrap(), None);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let (_dir, engine) = temp_engine();
        engine.write(|scope| scope.put(b"keep", b"1")).unwrap();

        let result: Result<()> = engine.write(|scope| {
            scope.put(b"keep", b"2")?;
            scope.put(b"new", b"x")?;
            Err(BucketKvError::Internal("boom".to_string()))
        });
        assert!(result.is_err());

        assert_eq!(
            engine.read(|scope| scope.get(b"keep")).unwrap(),
            Some(b"1".to_vec())
        );
        assert_eq!(engine.read(|scope| scope.get(b"new")).unwrap(), None);
    }

    #[test]
    fn test_write_scope_sees_own_writes() {
        let (_dir, engine) = temp_engine();
        let seen = engine
            .write(|scope| {
                scope.put(b"k", b"v")?;
                scope.get(b"k")
            })
            .unwrap();
        assert_eq!(seen, Some(b"v".to_vec()));
    }

    #[test]
    fn test_scan_prefix_bounds() {
        let (_dir, engine) = temp_engine();
        engine
            .write(|scope| {
                for key in [&b"a\x00z"[..], b"b\x00a", b"a\x00b", b"ab\x00a", b"\x00"] {
                    scope.put(key, b"")?;
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(
            collect(&engine, b"a\x00"),
            vec![b"a\x00b".to_vec(), b"a\x00z".to_vec()]
        );
        assert_eq!(collect(&engine, b"").len(), 5);
        assert!(collect(&engine, b"c").is_empty());
    }

    #[test]
    fn test_scan_stops_early() {
        let (_dir, engine) = temp_engine();
        engine
            .write(|scope| {
                for i in 0..10u8 {
                    scope.put(&[b'p', i], b"")?;
                }
                Ok(())
            })
            .unwrap();

        let visited = engine
            .read(|scope| {
                let mut count = 0;
                scope.scan(b"p", |_, _| {
                    count += 1;
                    Ok(if count == 3 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    })
                })?;
                Ok(count)
            })
            .unwrap();
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_snapshot_ignores_later_commits() {
        let (_dir, engine) = temp_engine();
        engine.write(|scope| scope.put(b"k", b"old")).unwrap();

        let (before, after) = engine
            .read(|scope| {
                let before = scope.get(b"k")?;
                // A concurrent writer commits while this snapshot is open.
                std::thread::scope(|s| {
                    s.spawn(|| engine.write(|w| w.put(b"k", b"new")).unwrap());
                });
                Ok((before, scope.get(b"k")?))
            })
            .unwrap();

        assert_eq!(before, Some(b"old".to_vec()));
        assert_eq!(after, Some(b"old".to_vec()));
        assert_eq!(
            engine.read(|scope| scope.get(b"k")).unwrap(),
            Some(b"new".to_vec())
        );
    }

    #[test]
    fn test_close_is_idempotent() {
        let (_dir, engine) = temp_engine();
        engine.close();
        engine.close();
        assert!(engine.is_closed());
        assert!(matches!(
            engine.read(|scope| scope.get(b"k")),
            Err(BucketKvError::Closed)
        ));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let engine = Engine::open_path(&path).unwrap();
            engine.write(|scope| scope.put(b"durable", b"yes")).unwrap();
        }
        let engine = Engine::open_path(&path).unwrap();
        assert_eq!(
            engine.read(|scope| scope.get(b"durable")).unwrap(),
            Some(b"yes".to_vec())
        );
    }
}
