// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-per-key storage engine.
//
// `FileStorageEngine` stores each key in its own file under the configured
// directory. Construction spawns directory setup through a `ReadinessGate`;
// every operation waits on the gate, computes the key's path, calls the
// `FileSystem` collaborator, and reports the outcome:
//
// - success: debug trace (when enabled), then `on_success`.
// - failure: "<prefix>: <message>" to the error sink, `on_fail` with a
//   `StorageError::Operation` carrying that message, then the original
//   error is returned.
//
// The engine takes no locks across operations. Concurrent writers to the
// same key race at the file system and the last write wins.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backend::PersistenceEngine;
use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::filesystem::{FileSystem, TokioFileSystem};
use crate::key::{decode_key, encode_key};
use crate::logger::render_value;
use crate::readiness::{ReadinessGate, ReadinessState};

/// Prefix on every message the engine emits.
pub const LOG_PREFIX: &str = "FileStorageEngine";

type SuccessCallback<T> = Box<dyn FnOnce(&T) + Send>;
type FailCallback = Box<dyn FnOnce(StorageError) + Send>;

/// Optional per-call callbacks.
///
/// `on_success` receives the operation's result; `on_fail` receives a
/// wrapped [`StorageError::Operation`] while the original error is still
/// returned to the caller.
pub struct Callbacks<T> {
    on_success: Option<SuccessCallback<T>>,
    on_fail: Option<FailCallback>,
}

impl<T> Callbacks<T> {
    pub fn new() -> Self {
        Self {
            on_success: None,
            on_fail: None,
        }
    }

    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_fail(mut self, f: impl FnOnce(StorageError) + Send + 'static) -> Self {
        self.on_fail = Some(Box::new(f));
        self
    }
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Callbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_fail", &self.on_fail.is_some())
            .finish()
    }
}

/// Key-value storage engine mapping each key to one file.
///
/// Must be constructed inside a tokio runtime; outside one, every operation
/// fails with [`StorageError::InitializationMissing`].
///
/// # Example
///
/// ```rust
/// use keyfile_storage::config::StorageConfig;
/// use keyfile_storage::engine::FileStorageEngine;
/// use keyfile_storage::memory::InMemoryFileSystem;
///
/// # tokio_test::block_on(async {
/// let config = StorageConfig::builder().storage_path("/state").build();
/// let engine = FileStorageEngine::with_filesystem(config, InMemoryFileSystem::new());
///
/// engine.set_item("user:1", r#"{"name":"Ana"}"#).await.unwrap();
/// assert_eq!(engine.get_item("user:1").await.unwrap(), r#"{"name":"Ana"}"#);
/// assert_eq!(engine.get_item("never-set").await.unwrap(), "");
/// # });
/// ```
pub struct FileStorageEngine<F: FileSystem = TokioFileSystem> {
    config: Arc<StorageConfig>,
    fs: Arc<F>,
    gate: ReadinessGate,
    /// Keys successfully read at least once by this instance.
    read_keys: Mutex<HashSet<String>>,
}

impl FileStorageEngine<TokioFileSystem> {
    /// Create an engine on the real file system.
    pub fn new(config: StorageConfig) -> Self {
        Self::with_filesystem(config, TokioFileSystem::new())
    }
}

impl<F: FileSystem> FileStorageEngine<F> {
    /// Create an engine on the given file-system provider and start its
    /// initialization task.
    pub fn with_filesystem(config: StorageConfig, fs: F) -> Self {
        let config = Arc::new(config);
        let fs = Arc::new(fs);
        let gate = ReadinessGate::start(initialize(Arc::clone(&config), Arc::clone(&fs)));
        Self {
            config,
            fs,
            gate,
            read_keys: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Current state of the initialization gate.
    pub fn state(&self) -> ReadinessState {
        self.gate.state()
    }

    /// Wait until initialization has settled.
    pub async fn wait_ready(&self) -> Result<(), StorageError> {
        self.gate.wait_ready().await
    }

    /// Path of the file backing `key`.
    pub fn file_path(&self, key: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.config.storage_path(), encode_key(key)))
    }

    fn directory(&self) -> &Path {
        Path::new(self.config.storage_path())
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.config.debug() {
            self.config
                .logger()
                .debug(&format!("[{LOG_PREFIX}] {}", message()));
        }
    }

    /// Log, hand a wrapped copy to `on_fail`, return the original.
    fn fail(&self, prefix: &str, err: StorageError, on_fail: Option<FailCallback>) -> StorageError {
        let message = format!("{prefix}: {err}");
        self.config
            .logger()
            .error(&format!("[{LOG_PREFIX}] {message}"));
        if let Some(on_fail) = on_fail {
            on_fail(StorageError::Operation(message));
        }
        err
    }

    async fn ready_or_fail(
        &self,
        prefix: &str,
        on_fail: &mut Option<FailCallback>,
    ) -> Result<(), StorageError> {
        self.gate
            .wait_ready()
            .await
            .map_err(|err| self.fail(prefix, err, on_fail.take()))
    }

    /// Read the item stored under `key`.
    ///
    /// A key that was never set reads as `""`.
    pub async fn get_item(&self, key: &str) -> Result<String, StorageError> {
        self.get_item_with(key, Callbacks::new()).await
    }

    /// [`get_item`](Self::get_item) with callbacks.
    ///
    /// A not-found read is only downgraded to `""` when this instance has
    /// never successfully read `key` and a follow-up existence check
    /// confirms the file is absent. Anything else is a real failure.
    pub async fn get_item_with(
        &self,
        key: &str,
        callbacks: Callbacks<String>,
    ) -> Result<String, StorageError> {
        let Callbacks {
            on_success,
            mut on_fail,
        } = callbacks;
        let prefix = format!("Error getting item {key}");
        self.ready_or_fail(&prefix, &mut on_fail).await?;

        let path = self.file_path(key);
        let content = match self.fs.read_file(&path, self.config.encoding()).await {
            Ok(content) => {
                self.read_keys.lock().await.insert(key.to_string());
                self.trace(|| format!("getItem {key}: {}", render_value(&content)));
                content
            }
            Err(err) => {
                if !(err.is_not_found() && self.never_set(key, &path).await) {
                    return Err(self.fail(&prefix, err, on_fail));
                }
                self.trace(|| format!("getItem {key}: not set"));
                String::new()
            }
        };

        if let Some(on_success) = on_success {
            on_success(&content);
        }
        Ok(content)
    }

    async fn never_set(&self, key: &str, path: &Path) -> bool {
        if self.read_keys.lock().await.contains(key) {
            return false;
        }
        matches!(self.fs.exists(path).await, Ok(false))
    }

    /// Store `value` under `key`, replacing any previous content.
    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_item_with(key, value, Callbacks::new()).await
    }

    /// [`set_item`](Self::set_item) with callbacks.
    pub async fn set_item_with(
        &self,
        key: &str,
        value: &str,
        callbacks: Callbacks<()>,
    ) -> Result<(), StorageError> {
        let Callbacks {
            on_success,
            mut on_fail,
        } = callbacks;
        let prefix = format!("Error setting item {key}");
        self.ready_or_fail(&prefix, &mut on_fail).await?;

        let path = self.file_path(key);
        if let Err(err) = self
            .fs
            .write_file(&path, value, self.config.encoding())
            .await
        {
            return Err(self.fail(&prefix, err, on_fail));
        }
        self.trace(|| format!("setItem {key}: {}", render_value(value)));

        if let Some(on_success) = on_success {
            on_success(&());
        }
        Ok(())
    }

    /// Delete the item stored under `key`. Absent keys are not an error.
    pub async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.remove_item_with(key, Callbacks::new()).await
    }

    /// [`remove_item`](Self::remove_item) with callbacks.
    pub async fn remove_item_with(
        &self,
        key: &str,
        callbacks: Callbacks<()>,
    ) -> Result<(), StorageError> {
        let Callbacks {
            on_success,
            mut on_fail,
        } = callbacks;
        let prefix = format!("Error removing item {key}");
        self.ready_or_fail(&prefix, &mut on_fail).await?;

        let path = self.file_path(key);
        if let Err(err) = self.fs.delete_file(&path, true).await {
            return Err(self.fail(&prefix, err, on_fail));
        }
        self.read_keys.lock().await.remove(key);
        self.trace(|| format!("removeItem {key}"));

        if let Some(on_success) = on_success {
            on_success(&());
        }
        Ok(())
    }

    /// Every stored key, in directory listing order.
    ///
    /// Entry names are percent-decoded, so a key only reads back through
    /// [`get_item`](Self::get_item) when the file was written by this engine.
    pub async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        self.get_all_keys_with(Callbacks::new()).await
    }

    /// [`get_all_keys`](Self::get_all_keys) with callbacks.
    pub async fn get_all_keys_with(
        &self,
        callbacks: Callbacks<Vec<String>>,
    ) -> Result<Vec<String>, StorageError> {
        let Callbacks {
            on_success,
            mut on_fail,
        } = callbacks;
        let prefix = "Error getting all keys";
        self.ready_or_fail(prefix, &mut on_fail).await?;

        let keys: Vec<String> = match self.fs.list_directory(self.directory()).await {
            Ok(entries) => entries.iter().map(|entry| decode_key(entry)).collect(),
            Err(err) => return Err(self.fail(prefix, err, on_fail)),
        };
        self.trace(|| format!("getAllKeys: {keys:?}"));

        if let Some(on_success) = on_success {
            on_success(&keys);
        }
        Ok(keys)
    }

    /// Delete every item by removing and recreating the storage directory.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.clear_with(Callbacks::new()).await
    }

    /// [`clear`](Self::clear) with callbacks.
    pub async fn clear_with(&self, callbacks: Callbacks<()>) -> Result<(), StorageError> {
        let Callbacks {
            on_success,
            mut on_fail,
        } = callbacks;
        let prefix = "Error clearing storage";
        self.ready_or_fail(prefix, &mut on_fail).await?;

        let dir = self.directory();
        let result = match self.fs.remove_directory(dir, true).await {
            Ok(()) => self.fs.make_directory(dir, true).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            return Err(self.fail(prefix, err, on_fail));
        }
        self.read_keys.lock().await.clear();
        self.trace(|| "clear: storage emptied".to_string());

        if let Some(on_success) = on_success {
            on_success(&());
        }
        Ok(())
    }

    /// Whether a file currently backs `key`.
    ///
    /// Advisory: collaborator errors are logged and read as `false`. Only a
    /// readiness failure is returned as an error.
    pub async fn item_exists(&self, key: &str) -> Result<bool, StorageError> {
        let prefix = format!("Error checking item {key}");
        self.ready_or_fail(&prefix, &mut None).await?;

        match self.fs.exists(&self.file_path(key)).await {
            Ok(exists) => {
                self.trace(|| format!("itemExists {key}: {exists}"));
                Ok(exists)
            }
            Err(err) => {
                self.fail(&prefix, err, None);
                Ok(false)
            }
        }
    }

    /// Whether the storage directory holds any entries.
    ///
    /// Advisory: listing errors are logged and read as `false`. Only a
    /// readiness failure is returned as an error.
    pub async fn has_stored_items(&self) -> Result<bool, StorageError> {
        let prefix = "Error checking for stored items";
        self.ready_or_fail(prefix, &mut None).await?;

        match self.fs.list_directory(self.directory()).await {
            Ok(entries) => {
                self.trace(|| format!("hasStoredItems: {} entries", entries.len()));
                Ok(!entries.is_empty())
            }
            Err(err) => {
                self.fail(prefix, err, None);
                Ok(false)
            }
        }
    }

    /// Read every stored item concurrently and log its normalized content on
    /// the debug sink.
    ///
    /// Per-key failures are logged and do not affect the other keys. The
    /// output is only visible when `debug` is enabled.
    pub async fn log_stored_items(&self) -> Result<(), StorageError> {
        let prefix = "Error getting all keys";
        self.ready_or_fail(prefix, &mut None).await?;

        let dir = self.directory();
        let entries = match self.fs.list_directory(dir).await {
            Ok(entries) => entries,
            Err(err) => return Err(self.fail(prefix, err, None)),
        };
        self.trace(|| format!("logStoredItems: {} keys", entries.len()));

        // Entries are read under their on-disk names, which need not be what
        // `encode_key` would produce for the decoded key.
        let encoding = self.config.encoding();
        let reads = entries.iter().map(|entry| {
            let path = dir.join(entry);
            async move { (decode_key(entry), self.fs.read_file(&path, encoding).await) }
        });
        for (key, result) in join_all(reads).await {
            match result {
                Ok(content) => self.trace(|| format!("{key}: {}", render_value(&content))),
                Err(err) => {
                    self.fail(&format!("Error reading stored item {key}"), err, None);
                }
            }
        }
        Ok(())
    }
}

/// Setup sequence run once by the readiness gate.
async fn initialize<F: FileSystem>(
    config: Arc<StorageConfig>,
    fs: Arc<F>,
) -> Result<(), StorageError> {
    let result = run_initialization(&config, fs.as_ref()).await;
    if let Err(ref err) = result {
        config
            .logger()
            .error(&format!("[{LOG_PREFIX}] Error initializing storage: {err}"));
    }
    result
}

async fn run_initialization<F: FileSystem>(
    config: &StorageConfig,
    fs: &F,
) -> Result<(), StorageError> {
    let dir = Path::new(config.storage_path());
    debug!(dir = %dir.display(), provider = fs.name(), "initializing storage");

    if let Some(hook) = config.before_init() {
        hook.run().await.map_err(|e| StorageError::Hook {
            stage: "beforeInit",
            message: e.to_string(),
        })?;
    }

    if !fs.exists(dir).await? {
        fs.make_directory(dir, true).await?;
        info!(dir = %dir.display(), "created storage directory");
        return Ok(());
    }

    if let Some(hook) = config.after_init() {
        hook.run().await.map_err(|e| StorageError::Hook {
            stage: "afterInit",
            message: e.to_string(),
        })?;
    }
    Ok(())
}

#[async_trait]
impl<F: FileSystem> PersistenceEngine for FileStorageEngine<F> {
    async fn get_item(&self, key: &str) -> Result<String, StorageError> {
        FileStorageEngine::get_item(self, key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        FileStorageEngine::set_item(self, key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        FileStorageEngine::remove_item(self, key).await
    }
}

impl<F: FileSystem> std::fmt::Debug for FileStorageEngine<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorageEngine")
            .field("storage_path", &self.config.storage_path())
            .field("provider", &self.fs.name())
            .field("state", &self.gate.state())
            .finish()
    }
}
