// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-system collaborator for the keyfile engine.
//
// The engine never touches the disk directly. It talks to a `FileSystem`,
// which provides exactly the handful of operations the engine needs. The
// default provider, `TokioFileSystem`, maps them onto `tokio::fs`; the
// in-memory provider lives in `crate::memory`.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;

use crate::config::Encoding;
use crate::error::StorageError;

/// Operations the engine requires from a hierarchical file system.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait FileSystem: Send + Sync + 'static {
    /// Check whether `path` exists (file or directory).
    async fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Read a whole file and decode it with `encoding`.
    ///
    /// Fails with a not-found error (see [`StorageError::is_not_found`]) if
    /// the file is absent.
    async fn read_file(&self, path: &Path, encoding: Encoding) -> Result<String, StorageError>;

    /// Create or overwrite a whole file.
    async fn write_file(
        &self,
        path: &Path,
        content: &str,
        encoding: Encoding,
    ) -> Result<(), StorageError>;

    /// Delete a file. With `idempotent`, an absent path is not an error.
    async fn delete_file(&self, path: &Path, idempotent: bool) -> Result<(), StorageError>;

    /// Recursively delete a directory. With `idempotent`, an absent path is
    /// not an error.
    async fn remove_directory(&self, path: &Path, idempotent: bool) -> Result<(), StorageError>;

    /// List entry names directly under `path`, in whatever order the
    /// provider yields them.
    async fn list_directory(&self, path: &Path) -> Result<Vec<String>, StorageError>;

    /// Create a directory. With `intermediates`, missing parents are created
    /// too and an existing directory is not an error.
    async fn make_directory(&self, path: &Path, intermediates: bool) -> Result<(), StorageError>;

    /// A human-readable name for this provider, used in logging.
    fn name(&self) -> &str;
}

/// Real-disk provider backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }
}

/// Swallow not-found errors when the caller asked for idempotence.
fn tolerate_missing(result: std::io::Result<()>, idempotent: bool) -> Result<(), StorageError> {
    match result {
        Err(err) if idempotent && err.kind() == ErrorKind::NotFound => Ok(()),
        other => other.map_err(StorageError::Io),
    }
}

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn read_file(&self, path: &Path, encoding: Encoding) -> Result<String, StorageError> {
        let bytes = tokio::fs::read(path).await?;
        encoding.to_content(bytes)
    }

    async fn write_file(
        &self,
        path: &Path,
        content: &str,
        encoding: Encoding,
    ) -> Result<(), StorageError> {
        let bytes = encoding.to_bytes(content)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn delete_file(&self, path: &Path, idempotent: bool) -> Result<(), StorageError> {
        tolerate_missing(tokio::fs::remove_file(path).await, idempotent)
    }

    async fn remove_directory(&self, path: &Path, idempotent: bool) -> Result<(), StorageError> {
        tolerate_missing(tokio::fs::remove_dir_all(path).await, idempotent)
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<String>, StorageError> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn make_directory(&self, path: &Path, intermediates: bool) -> Result<(), StorageError> {
        if intermediates {
            tokio::fs::create_dir_all(path).await?;
        } else {
            tokio::fs::create_dir(path).await?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tokio-fs"
    }
}
