// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.
//
// `StorageConfig` is fixed once the engine is built. Every field has an
// explicit default; only the two lifecycle hooks are optional. The builder
// normalizes `storage_path` so it always ends in a path separator.

use std::fmt;
use std::future::Future;
use std::path::{PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::{BoxFuture, FutureExt};

use crate::error::{HookError, StorageError};
use crate::logger::Logger;

/// Subfolder created under the platform document directory by default.
pub const DEFAULT_SUBFOLDER: &str = "keyfile-store";

/// How item content is represented on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Values are UTF-8 text, stored verbatim.
    #[default]
    Text,
    /// Values are base64 text; the decoded bytes are stored.
    Binary,
}

impl Encoding {
    /// Convert a caller-facing value into the bytes written to disk.
    pub fn to_bytes(self, content: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            Encoding::Text => Ok(content.as_bytes().to_vec()),
            Encoding::Binary => STANDARD
                .decode(content)
                .map_err(|e| StorageError::Encoding(format!("invalid base64 content: {e}"))),
        }
    }

    /// Convert bytes read from disk into the caller-facing value.
    pub fn to_content(self, bytes: Vec<u8>) -> Result<String, StorageError> {
        match self {
            Encoding::Text => String::from_utf8(bytes)
                .map_err(|e| StorageError::Encoding(format!("content is not UTF-8: {e}"))),
            Encoding::Binary => Ok(STANDARD.encode(bytes)),
        }
    }
}

/// A zero-argument lifecycle hook, synchronous or asynchronous.
#[derive(Clone)]
pub struct InitHook(Arc<dyn Fn() -> BoxFuture<'static, Result<(), HookError>> + Send + Sync>);

impl InitHook {
    /// Wrap a synchronous closure.
    pub fn from_fn<F>(hook: F) -> Self
    where
        F: Fn() -> Result<(), HookError> + Send + Sync + 'static,
    {
        Self(Arc::new(move || std::future::ready(hook()).boxed()))
    }

    /// Wrap a closure returning a future.
    pub fn from_async<F, Fut>(hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        Self(Arc::new(move || hook().boxed()))
    }

    pub(crate) async fn run(&self) -> Result<(), HookError> {
        (self.0)().await
    }
}

impl fmt::Debug for InitHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InitHook")
    }
}

/// Configuration for a [`crate::engine::FileStorageEngine`].
#[derive(Debug, Clone)]
pub struct StorageConfig {
    storage_path: String,
    encoding: Encoding,
    debug: bool,
    logger: Logger,
    before_init: Option<InitHook>,
    after_init: Option<InitHook>,
}

impl StorageConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> StorageConfigBuilder {
        StorageConfigBuilder::default()
    }

    /// Directory holding one file per key. Always ends in a separator.
    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn before_init(&self) -> Option<&InitHook> {
        self.before_init.as_ref()
    }

    pub fn after_init(&self) -> Option<&InitHook> {
        self.after_init.as_ref()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfigBuilder::default().build()
    }
}

/// Builder for [`StorageConfig`].
#[derive(Debug, Default)]
pub struct StorageConfigBuilder {
    storage_path: Option<String>,
    encoding: Encoding,
    debug: bool,
    logger: Option<Logger>,
    before_init: Option<InitHook>,
    after_init: Option<InitHook>,
}

impl StorageConfigBuilder {
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into().to_string_lossy().into_owned());
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn before_init(mut self, hook: InitHook) -> Self {
        self.before_init = Some(hook);
        self
    }

    pub fn after_init(mut self, hook: InitHook) -> Self {
        self.after_init = Some(hook);
        self
    }

    pub fn build(self) -> StorageConfig {
        let storage_path = self.storage_path.unwrap_or_else(default_storage_path);
        StorageConfig {
            storage_path: with_trailing_separator(storage_path),
            encoding: self.encoding,
            debug: self.debug,
            logger: self.logger.unwrap_or_default(),
            before_init: self.before_init,
            after_init: self.after_init,
        }
    }
}

/// `<documents>/keyfile-store`, falling back to the working directory.
pub fn default_storage_path() -> String {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SUBFOLDER)
        .to_string_lossy()
        .into_owned()
}

fn with_trailing_separator(mut path: String) -> String {
    if !path.ends_with(MAIN_SEPARATOR) && !path.ends_with('/') {
        path.push(MAIN_SEPARATOR);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.encoding(), Encoding::Text);
        assert!(!config.debug());
        assert!(config.before_init().is_none());
        assert!(config.after_init().is_none());
        assert!(config.storage_path().ends_with(MAIN_SEPARATOR));
        assert!(config
            .storage_path()
            .trim_end_matches(MAIN_SEPARATOR)
            .ends_with(DEFAULT_SUBFOLDER));
    }

    #[test]
    fn test_trailing_separator_is_added_once() {
        let config = StorageConfig::builder().storage_path("/tmp/store").build();
        assert_eq!(config.storage_path(), format!("/tmp/store{MAIN_SEPARATOR}"));

        let config = StorageConfig::builder().storage_path("/tmp/store/").build();
        assert_eq!(config.storage_path(), "/tmp/store/");
    }

    #[test]
    fn test_builder_overrides() {
        let config = StorageConfig::builder()
            .encoding(Encoding::Binary)
            .debug(true)
            .build();
        assert_eq!(config.encoding(), Encoding::Binary);
        assert!(config.debug());
    }

    #[test]
    fn test_text_encoding() {
        let bytes = Encoding::Text.to_bytes("héllo").unwrap();
        assert_eq!(Encoding::Text.to_content(bytes).unwrap(), "héllo");
        assert!(matches!(
            Encoding::Text.to_content(vec![0xff, 0xfe]),
            Err(StorageError::Encoding(_))
        ));
    }

    #[test]
    fn test_binary_encoding() {
        assert_eq!(Encoding::Binary.to_bytes("aGVsbG8=").unwrap(), b"hello".to_vec());
        assert_eq!(Encoding::Binary.to_content(b"hello".to_vec()).unwrap(), "aGVsbG8=");
        assert!(matches!(
            Encoding::Binary.to_bytes("not base64!"),
            Err(StorageError::Encoding(_))
        ));
    }

    #[tokio::test]
    async fn test_sync_and_async_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let sync_hook = InitHook::from_fn(move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let c = Arc::clone(&calls);
        let async_hook = InitHook::from_async(move || {
            let c = Arc::clone(&c);
            async move {
                tokio::task::yield_now().await;
                c.fetch_add(10, Ordering::SeqCst);
                Ok(())
            }
        });

        sync_hook.run().await.unwrap();
        async_hook.run().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn test_failing_hook_reports_error() {
        let hook = InitHook::from_fn(|| Err("nope".into()));
        let err = hook.run().await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }
}
