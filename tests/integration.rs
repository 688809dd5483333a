//! BucketKV - Integration Tests
//! End-to-end tests validating the store lifecycle:
//! open → set → get → delete → list → close → reopen.

use std::sync::Arc;
use std::thread;

use bucketkv::config::{Config, Secret};
use bucketkv::store::Store;
use bucketkv::types::RecordId;
use bucketkv::BucketKvError;

mod common {
    use super::*;

    /// Create a Config pointing to a temporary directory.
    pub fn temp_config(dir: &std::path::Path) -> Config {
        Config::new(dir, Secret::new("integration-secret").unwrap())
    }

    pub fn id(bucket: &str, key: &str) -> RecordId {
        RecordId::new(bucket, key).unwrap()
    }
}

use common::id;

#[test]
fn test_basic_set_get_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&common::temp_config(dir.path())).unwrap();

    store.set(&id("users", "42"), &[0xDE, 0xAD]).unwrap();
    store.set(&id("users", "7"), b"seven").unwrap();

    assert_eq!(store.get(&id("users", "42")).unwrap(), vec![0xDE, 0xAD]);
    assert!(matches!(
        store.get(&id("users", "43")),
        Err(BucketKvError::NotFound)
    ));

    store.delete(&id("users", "42")).unwrap();
    assert!(matches!(
        store.get(&id("users", "42")),
        Err(BucketKvError::NotFound)
    ));
    assert_eq!(store.list_keys("users").unwrap(), vec!["7"]);
}

#[test]
fn test_database_file_lives_in_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("nested").join("data");
    let config = common::temp_config(&data_dir);

    let store = Store::open(&config).unwrap();
    store.set(&id("b", "k"), b"v").unwrap();

    assert!(config.db_path().exists());
    assert_eq!(store.engine().path(), config.db_path());
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();

    // Phase 1: write data and close
    {
        let store = Store::open(&common::temp_config(dir.path())).unwrap();
        store.set(&id("orders", "1"), b"first").unwrap();
        store.set(&id("orders", "2"), b"second").unwrap();
        store.set(&id("tmp", "x"), b"gone").unwrap();
        store.delete(&id("tmp", "x")).unwrap();
        store.close();
    }

    // Phase 2: reopen and verify
    {
        let store = Store::open(&common::temp_config(dir.path())).unwrap();
        assert_eq!(store.get(&id("orders", "1")).unwrap(), b"first");
        assert_eq!(store.list_keys("orders").unwrap(), vec!["1", "2"]);
        assert_eq!(store.list_buckets().unwrap(), vec!["orders"]);
    }
}

#[test]
fn test_bucket_disappears_with_last_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&common::temp_config(dir.path())).unwrap();

    store.set(&id("a", "1"), b"x").unwrap();
    store.set(&id("b", "1"), b"y").unwrap();
    assert_eq!(store.list_buckets().unwrap(), vec!["a", "b"]);

    store.delete(&id("a", "1")).unwrap();
    assert_eq!(store.list_buckets().unwrap(), vec!["b"]);
    assert!(store.list_keys("a").unwrap().is_empty());
}

#[test]
fn test_unicode_and_separator_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&common::temp_config(dir.path())).unwrap();

    store.set(&id("café", "日本語"), b"coffee").unwrap();
    store.set(&id("🦀", "a:b"), b"crab").unwrap();
    store.set(&id("🦀:a", "b"), b"not crab").unwrap();

    assert_eq!(store.get(&id("café", "日本語")).unwrap(), b"coffee");
    assert_eq!(store.get(&id("🦀", "a:b")).unwrap(), b"crab");
    assert_eq!(store.get(&id("🦀:a", "b")).unwrap(), b"not crab");
    assert_eq!(store.list_keys("🦀").unwrap(), vec!["a:b"]);
}

#[test]
fn test_large_values() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&common::temp_config(dir.path())).unwrap();

    let large_value = vec![0xABu8; 4 * 1024 * 1024];
    store.set(&id("blobs", "big"), &large_value).unwrap();

    assert_eq!(store.get(&id("blobs", "big")).unwrap(), large_value);
}

#[test]
fn test_concurrent_writers_distinct_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(&common::temp_config(dir.path())).unwrap());
    let mut handles = vec![];

    for t in 0..8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let key = format!("key_{:02}_{:02}", t, i);
                store
                    .set(&id(&format!("bucket_{}", t % 3), &key), key.as_bytes())
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let mut total = 0;
    for bucket in store.list_buckets().unwrap() {
        for key in store.list_keys(&bucket).unwrap() {
            assert_eq!(store.get(&id(&bucket, &key)).unwrap(), key.as_bytes());
            total += 1;
        }
    }
    assert_eq!(total, 200);
    assert_eq!(store.list_buckets().unwrap().len(), 3);
}

#[test]
fn test_listing_during_concurrent_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(&common::temp_config(dir.path())).unwrap());
    for i in 0..100 {
        store.set(&id("stable", &format!("{:03}", i)), b"").unwrap();
    }

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..100 {
                store.set(&id("churn", &format!("{:03}", i)), b"").unwrap();
                store.delete(&id("churn", &format!("{:03}", i))).unwrap();
            }
        })
    };

    // Scans never see a partial view of the untouched bucket.
    for _ in 0..20 {
        assert_eq!(store.list_keys("stable").unwrap().len(), 100);
    }
    writer.join().unwrap();

    assert_eq!(store.list_buckets().unwrap(), vec!["stable"]);
}

#[test]
fn test_closed_store_rejects_operations() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&common::temp_config(dir.path())).unwrap();
    store.close();
    store.close();

    assert!(matches!(
        store.list_buckets(),
        Err(BucketKvError::Closed)
    ));
}

#[test]
fn test_unopenable_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    // data_dir is a regular file, so the directory cannot be created
    let result = Store::open(&common::temp_config(&blocker));
    assert!(result.is_err());
}

#[test]
fn test_corrupt_database_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path());
    std::fs::write(config.db_path(), vec![0x42u8; 8192]).unwrap();

    assert!(Store::open(&config).is_err());
}
