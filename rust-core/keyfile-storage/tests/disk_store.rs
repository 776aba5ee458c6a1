// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for the keyfile engine on a real directory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keyfile_storage::{
    Callbacks, Encoding, FileStorageEngine, InitHook, ReadinessState, StorageConfig,
    StorageError, TypedStore,
};
use proptest::prelude::*;
use tempfile::TempDir;

/// Engine rooted in a nested, not-yet-existing directory under a temp dir.
fn disk_engine(dir: &TempDir) -> FileStorageEngine {
    let config = StorageConfig::builder()
        .storage_path(dir.path().join("app").join("store"))
        .build();
    FileStorageEngine::new(config)
}

#[tokio::test]
async fn test_default_config_round_trip() {
    let dir = TempDir::new().unwrap();
    let engine = disk_engine(&dir);

    engine.set_item("user:1", "{\"name\":\"Ana\"}").await.unwrap();
    assert_eq!(engine.get_item("user:1").await.unwrap(), "{\"name\":\"Ana\"}");

    // One file per key, named by the encoder, content verbatim.
    let on_disk = std::fs::read_to_string(dir.path().join("app/store/user-1")).unwrap();
    assert_eq!(on_disk, "{\"name\":\"Ana\"}");
}

#[tokio::test]
async fn test_intermediate_directories_are_created() {
    let dir = TempDir::new().unwrap();
    let engine = disk_engine(&dir);
    engine.wait_ready().await.unwrap();
    assert_eq!(engine.state(), ReadinessState::Ready);
    assert!(dir.path().join("app/store").is_dir());
}

#[tokio::test]
async fn test_get_all_keys_after_sets() {
    let dir = TempDir::new().unwrap();
    let engine = disk_engine(&dir);
    for key in ["a", "b", "c"] {
        engine.set_item(key, "x").await.unwrap();
    }

    let mut keys = engine.get_all_keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_directory_name_keys_stay_inside_storage() {
    let dir = TempDir::new().unwrap();
    let engine = disk_engine(&dir);

    for key in ["", ".", ".."] {
        engine.set_item(key, key).await.unwrap();
        assert_eq!(engine.get_item(key).await.unwrap(), key);
        assert!(engine.item_exists(key).await.unwrap());
    }

    let mut keys = engine.get_all_keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["-", "--"]);
    assert_eq!(std::fs::read_to_string(dir.path().join("app/store/--")).unwrap(), "..");
    assert!(!dir.path().join("app/--").exists());

    for key in ["", ".", ".."] {
        engine.remove_item(key).await.unwrap();
    }
    assert!(!engine.has_stored_items().await.unwrap());
}

#[tokio::test]
async fn test_clear_then_list_is_empty() {
    let dir = TempDir::new().unwrap();
    let engine = disk_engine(&dir);
    for i in 0..10 {
        engine.set_item(&format!("k{i}"), "v").await.unwrap();
    }
    assert!(engine.has_stored_items().await.unwrap());

    engine.clear().await.unwrap();
    assert!(engine.get_all_keys().await.unwrap().is_empty());
    assert!(!engine.has_stored_items().await.unwrap());
    assert!(dir.path().join("app/store").is_dir());
}

#[tokio::test]
async fn test_never_set_key_reads_empty_without_failure() {
    let dir = TempDir::new().unwrap();
    let engine = disk_engine(&dir);
    let failed = Arc::new(AtomicBool::new(false));
    let f = Arc::clone(&failed);

    let value = engine
        .get_item_with(
            "missing",
            Callbacks::new().on_fail(move |_| f.store(true, Ordering::SeqCst)),
        )
        .await
        .unwrap();
    assert_eq!(value, "");
    assert!(!failed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_remove_is_idempotent_and_exists_tracks_it() {
    let dir = TempDir::new().unwrap();
    let engine = disk_engine(&dir);

    engine.remove_item("nope").await.unwrap();

    engine.set_item("k", "v").await.unwrap();
    assert!(engine.item_exists("k").await.unwrap());
    engine.remove_item("k").await.unwrap();
    assert!(!engine.item_exists("k").await.unwrap());
    engine.remove_item("k").await.unwrap();
}

#[tokio::test]
async fn test_failing_before_init_hook_fails_operations() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::builder()
        .storage_path(dir.path().join("never"))
        .before_init(InitHook::from_async(|| async {
            Err::<(), _>("cannot prepare storage".into())
        }))
        .build();
    let engine = FileStorageEngine::new(config);

    let err = engine.get_item("k").await.unwrap_err();
    assert!(matches!(err, StorageError::Initialization(_)));
    let err = engine.set_item("k", "v").await.unwrap_err();
    assert!(err.is_initialization());
    assert!(!dir.path().join("never").exists());
}

#[tokio::test]
async fn test_after_init_runs_for_existing_directory() {
    let dir = TempDir::new().unwrap();
    let ran = Arc::new(AtomicBool::new(false));
    let r = Arc::clone(&ran);

    let config = StorageConfig::builder()
        .storage_path(dir.path())
        .after_init(InitHook::from_fn(move || {
            r.store(true, Ordering::SeqCst);
            Ok(())
        }))
        .build();
    let engine = FileStorageEngine::new(config);
    engine.wait_ready().await.unwrap();
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_data_survives_a_new_engine_instance() {
    let dir = TempDir::new().unwrap();
    disk_engine(&dir).set_item("persist:root", "{}").await.unwrap();

    let reopened = disk_engine(&dir);
    assert_eq!(reopened.get_item("persist:root").await.unwrap(), "{}");
    assert_eq!(reopened.get_all_keys().await.unwrap(), vec!["persist-root"]);
}

#[tokio::test]
async fn test_binary_mode_stores_raw_bytes() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::builder()
        .storage_path(dir.path())
        .encoding(Encoding::Binary)
        .build();
    let engine = FileStorageEngine::new(config);

    engine.set_item("img", "iVBORw0KGgo=").await.unwrap();
    let bytes = std::fs::read(dir.path().join("img")).unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    assert_eq!(engine.get_item("img").await.unwrap(), "iVBORw0KGgo=");
}

#[tokio::test]
async fn test_percent_encoded_file_names_decode_to_keys() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("user%3A7"), "seeded").unwrap();
    let engine = FileStorageEngine::new(StorageConfig::builder().storage_path(dir.path()).build());

    assert_eq!(engine.get_all_keys().await.unwrap(), vec!["user:7"]);
}

#[tokio::test]
async fn test_concurrent_writes_to_distinct_keys() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(disk_engine(&dir));

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.set_item(&format!("key-{i}"), &i.to_string()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(engine.get_all_keys().await.unwrap().len(), 16);
    assert_eq!(engine.get_item("key-7").await.unwrap(), "7");
}

#[tokio::test]
async fn test_typed_store_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = TypedStore::new(disk_engine(&dir), "persist");

    store.put("settings", &serde_json::json!({"theme": "dark"})).await.unwrap();
    let value: serde_json::Value = store.get("settings").await.unwrap().unwrap();
    assert_eq!(value["theme"], "dark");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_set_then_get_round_trips(key in "[a-z:/ ]{1,16}", value in ".*") {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let dir = TempDir::new().unwrap();
        let read = runtime.block_on(async {
            let engine = disk_engine(&dir);
            engine.set_item(&key, &value).await.unwrap();
            engine.get_item(&key).await.unwrap()
        });
        prop_assert_eq!(read, value);
    }
}
