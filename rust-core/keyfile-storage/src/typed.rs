// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed storage wrapper for the keyfile engine.
//
// Provides a serde-based interface on top of any `PersistenceEngine`. Values
// are serialized as JSON and every key is prefixed with a namespace, so
// several logical stores can share one directory without key clashes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::PersistenceEngine;
use crate::error::StorageError;

/// A typed wrapper around a [`PersistenceEngine`] that handles
/// serialization and namespace prefixing.
///
/// Keys are stored as `"{namespace}:{key}"`. An empty stored value (the
/// engine's answer for an item that was never set) reads back as `None`.
///
/// # Example
///
/// ```rust
/// use keyfile_storage::config::StorageConfig;
/// use keyfile_storage::engine::FileStorageEngine;
/// use keyfile_storage::memory::InMemoryFileSystem;
/// use keyfile_storage::typed::TypedStore;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize, PartialEq)]
/// struct Session { user: String, visits: u32 }
///
/// # tokio_test::block_on(async {
/// let config = StorageConfig::builder().storage_path("/app").build();
/// let engine = FileStorageEngine::with_filesystem(config, InMemoryFileSystem::new());
/// let store = TypedStore::new(engine, "session");
///
/// let session = Session { user: "ana".into(), visits: 3 };
/// store.put("current", &session).await.unwrap();
///
/// let restored: Session = store.get("current").await.unwrap().unwrap();
/// assert_eq!(restored, session);
/// # });
/// ```
pub struct TypedStore<E: PersistenceEngine> {
    engine: E,
    namespace: String,
}

impl<E: PersistenceEngine> TypedStore<E> {
    /// Wrap `engine`; every key gets the `"{namespace}:"` prefix.
    pub fn new(engine: E, namespace: &str) -> Self {
        Self {
            engine,
            namespace: namespace.to_string(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Retrieve and deserialize a value. Returns `Ok(None)` if it was never
    /// stored.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let raw = self.engine.get_item(&self.prefixed_key(key)).await?;
        if raw.is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&raw).map_err(|err| {
            StorageError::Serialization(format!(
                "failed to deserialize value for key '{}': {}",
                key, err
            ))
        })?;
        Ok(Some(value))
    }

    /// Serialize and store a value.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|err| {
            StorageError::Serialization(format!(
                "failed to serialize value for key '{}': {}",
                key, err
            ))
        })?;
        self.engine.set_item(&self.prefixed_key(key), &raw).await
    }

    /// Delete a value. Absent keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.engine.remove_item(&self.prefixed_key(key)).await
    }
}
