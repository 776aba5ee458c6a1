// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// keyfile storage engine
//
// A key-value persistence engine that stores every key in its own file
// inside a configured directory. It is meant to sit underneath a state
// persistence library: the host asks for get/set/remove by string key, and
// the engine maps each key to a file, waits for its directory to be ready,
// and reports outcomes through logging and optional callbacks.
//
// # Modules
//
// - [`backend`] -- The `PersistenceEngine` trait consumed by host libraries.
// - [`engine`] -- `FileStorageEngine`, the file-per-key implementation.
// - [`readiness`] -- The initialization gate every operation waits on.
// - [`filesystem`] -- The `FileSystem` collaborator trait and the
//   `tokio::fs` provider.
// - [`memory`] -- An in-memory `FileSystem` for tests and ephemeral stores.
// - [`key`] -- Key to file-name encoding.
// - [`normalize`] -- Deep JSON normalization for debug output.
// - [`config`] -- `StorageConfig`, encodings and lifecycle hooks.
// - [`logger`] -- Debug and error sinks.
// - [`typed`] -- A serde-based typed wrapper with namespace prefixing.
// - [`error`] -- The `StorageError` enum.
//
// # Example
//
// ```rust
// use keyfile_storage::{FileStorageEngine, InMemoryFileSystem, StorageConfig};
//
// # tokio_test::block_on(async {
// let config = StorageConfig::builder().storage_path("/state").build();
// let engine = FileStorageEngine::with_filesystem(config, InMemoryFileSystem::new());
//
// engine.set_item("a", "1").await.unwrap();
// engine.set_item("b", "2").await.unwrap();
// assert!(engine.has_stored_items().await.unwrap());
//
// engine.clear().await.unwrap();
// assert!(engine.get_all_keys().await.unwrap().is_empty());
// # });
// ```

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod filesystem;
pub mod key;
pub mod logger;
pub mod memory;
pub mod normalize;
pub mod readiness;
pub mod typed;

// Re-export the most commonly used types at the crate root for convenience.
pub use backend::PersistenceEngine;
pub use config::{Encoding, InitHook, StorageConfig, StorageConfigBuilder};
pub use engine::{Callbacks, FileStorageEngine, LOG_PREFIX};
pub use error::{HookError, StorageError};
pub use filesystem::{FileSystem, TokioFileSystem};
pub use logger::Logger;
pub use memory::InMemoryFileSystem;
pub use readiness::{ReadinessGate, ReadinessState};
pub use typed::TypedStore;
