// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistence contract consumed by state-persistence libraries.
//
// Host libraries only need get/set/remove over string keys and string
// values. `FileStorageEngine` implements this trait; its extended operations
// (listing, clearing, existence checks) stay inherent to the engine.

use async_trait::async_trait;

use crate::error::StorageError;

/// Minimal key-value persistence interface.
///
/// Higher-level typed access is provided by [`crate::typed::TypedStore`],
/// which wraps an engine with serde-based serialization and namespace
/// prefixing.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait PersistenceEngine: Send + Sync {
    /// Retrieve the value stored under `key`.
    ///
    /// An item that was never set reads as an empty string rather than an
    /// error.
    async fn get_item(&self, key: &str) -> Result<String, StorageError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Deleting an absent key succeeds.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
