/*!
 * Tests for the durable page cache
 */

use std::sync::Arc;

use doctran::document::PageTranslation;
use doctran::errors::CacheError;
use doctran::pipeline::CacheStore;

fn translation(index: u32) -> PageTranslation {
    PageTranslation {
        index,
        original: format!("original {}", index),
        translated: format!("translated {}", index),
    }
}

#[test]
fn test_cacheStore_loadAfterUpserts_shouldSeeSameKeysOnDisk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let store = CacheStore::new(&path);
    for index in [2, 5, 1] {
        store.upsert(translation(index)).unwrap();
    }

    // A reader of the persisted file sees exactly the in-memory keys
    let reader = CacheStore::new(&path);
    reader.load().unwrap();
    assert_eq!(reader.cached_indices(), store.cached_indices());
    assert_eq!(reader.get(5), Some(translation(5)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cacheStore_upsert_withConcurrentWriters_shouldKeepEveryEntry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    let store = Arc::new(CacheStore::new(&path));

    // Disjoint indices from many tasks; the internal lock totally orders
    // the write-throughs
    let mut handles = Vec::new();
    for index in 1..=20u32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.upsert(translation(index)).unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.len(), 20);

    // The file on disk is valid JSON containing every entry
    let reader = CacheStore::new(&path);
    assert_eq!(reader.load().unwrap(), 20);
}

#[test]
fn test_cacheStore_load_withCorruptRecord_shouldNotTreatAsEmpty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{\"1\": {\"index\": 1").unwrap();

    let store = CacheStore::new(&path);
    let error = store.load().unwrap_err();
    assert!(matches!(error, CacheError::Corrupt { .. }));
}

#[test]
fn test_cacheStore_upsert_withUnwritablePath_shouldReturnIoError() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the record's parent directory should be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "in the way").unwrap();

    let store = CacheStore::new(blocker.join("cache.json"));
    let error = store.upsert(translation(1)).unwrap_err();
    assert!(matches!(error, CacheError::Io { .. }));
}

#[test]
fn test_cacheStore_upsert_withSameIndex_shouldReplaceEntry() {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::new(dir.path().join("cache.json"));

    store.upsert(translation(1)).unwrap();
    let mut replacement = translation(1);
    replacement.translated = "newer".to_string();
    store.upsert(replacement.clone()).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get(1), Some(replacement));
}

#[test]
fn test_cacheStore_clear_shouldDropMemoryOnly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let store = CacheStore::new(&path);
    store.upsert(translation(1)).unwrap();
    store.clear();
    assert!(store.is_empty());

    // The record on disk still holds the entry until the next write-through
    let reader = CacheStore::new(&path);
    assert_eq!(reader.load().unwrap(), 1);
}
