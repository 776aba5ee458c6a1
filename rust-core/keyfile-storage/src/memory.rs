// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory file-system provider for the keyfile engine.
//
// Uses a `BTreeMap` of paths wrapped in a tokio `RwLock`. Directories are
// explicit entries, so writes into a missing directory fail the same way
// they would on disk. Intended for testing, development, and ephemeral
// stores.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::Encoding;
use crate::error::StorageError;
use crate::filesystem::FileSystem;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Directory,
}

/// An in-memory file tree.
///
/// All data lives in process memory and is lost on drop. Clones share the
/// same tree.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use keyfile_storage::config::Encoding;
/// use keyfile_storage::filesystem::FileSystem;
/// use keyfile_storage::memory::InMemoryFileSystem;
///
/// # tokio_test::block_on(async {
/// let fs = InMemoryFileSystem::new();
/// fs.make_directory(Path::new("/store"), true).await.unwrap();
/// fs.write_file(Path::new("/store/k"), "v", Encoding::Text).await.unwrap();
/// let val = fs.read_file(Path::new("/store/k"), Encoding::Text).await.unwrap();
/// assert_eq!(val, "v");
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryFileSystem {
    nodes: Arc<RwLock<BTreeMap<PathBuf, Node>>>,
}

fn not_found(path: &Path) -> StorageError {
    StorageError::Io(std::io::Error::new(
        ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    ))
}

fn io_error(kind: ErrorKind, what: &str, path: &Path) -> StorageError {
    StorageError::Io(std::io::Error::new(kind, format!("{what}: {}", path.display())))
}

/// The tree holds no `..` entries; such a path names a directory, never a file.
fn reject_parent_component(path: &Path) -> Result<(), StorageError> {
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(io_error(ErrorKind::InvalidInput, "parent-directory component", path));
    }
    Ok(())
}

/// Paths without a parent (`/`, `""`) always exist.
fn parent_exists(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> bool {
    match path.parent() {
        None => true,
        Some(parent) if parent.as_os_str().is_empty() => true,
        Some(parent) => matches!(nodes.get(parent), Some(Node::Directory)),
    }
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files (not directories) in the tree.
    pub async fn file_count(&self) -> usize {
        self.nodes
            .read()
            .await
            .values()
            .filter(|node| matches!(node, Node::File(_)))
            .count()
    }
}

#[async_trait]
impl FileSystem for InMemoryFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(self.nodes.read().await.contains_key(path))
    }

    async fn read_file(&self, path: &Path, encoding: Encoding) -> Result<String, StorageError> {
        reject_parent_component(path)?;
        let nodes = self.nodes.read().await;
        match nodes.get(path) {
            Some(Node::File(bytes)) => encoding.to_content(bytes.clone()),
            Some(Node::Directory) => Err(io_error(ErrorKind::Other, "is a directory", path)),
            None => Err(not_found(path)),
        }
    }

    async fn write_file(
        &self,
        path: &Path,
        content: &str,
        encoding: Encoding,
    ) -> Result<(), StorageError> {
        reject_parent_component(path)?;
        let bytes = encoding.to_bytes(content)?;
        let mut nodes = self.nodes.write().await;
        if !parent_exists(&nodes, path) {
            return Err(not_found(path));
        }
        if matches!(nodes.get(path), Some(Node::Directory)) {
            return Err(io_error(ErrorKind::Other, "is a directory", path));
        }
        nodes.insert(path.to_path_buf(), Node::File(bytes));
        Ok(())
    }

    async fn delete_file(&self, path: &Path, idempotent: bool) -> Result<(), StorageError> {
        reject_parent_component(path)?;
        let mut nodes = self.nodes.write().await;
        match nodes.get(path) {
            Some(Node::File(_)) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Directory) => Err(io_error(ErrorKind::Other, "is a directory", path)),
            None if idempotent => Ok(()),
            None => Err(not_found(path)),
        }
    }

    async fn remove_directory(&self, path: &Path, idempotent: bool) -> Result<(), StorageError> {
        let mut nodes = self.nodes.write().await;
        match nodes.get(path) {
            Some(Node::Directory) => {
                nodes.retain(|candidate, _| !candidate.starts_with(path));
                Ok(())
            }
            Some(Node::File(_)) => Err(io_error(ErrorKind::Other, "not a directory", path)),
            None if idempotent => Ok(()),
            None => Err(not_found(path)),
        }
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<String>, StorageError> {
        let nodes = self.nodes.read().await;
        match nodes.get(path) {
            Some(Node::Directory) => {}
            Some(Node::File(_)) => {
                return Err(io_error(ErrorKind::Other, "not a directory", path))
            }
            None => return Err(not_found(path)),
        }
        let names = nodes
            .range(path.to_path_buf()..)
            .skip(1)
            .take_while(|(candidate, _)| candidate.starts_with(path))
            .filter(|(candidate, _)| candidate.parent() == Some(path))
            .filter_map(|(candidate, _)| candidate.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        Ok(names)
    }

    async fn make_directory(&self, path: &Path, intermediates: bool) -> Result<(), StorageError> {
        let mut nodes = self.nodes.write().await;
        if let Some(Node::File(_)) = nodes.get(path) {
            return Err(io_error(ErrorKind::AlreadyExists, "file exists", path));
        }
        if !intermediates {
            if nodes.contains_key(path) {
                return Err(io_error(ErrorKind::AlreadyExists, "directory exists", path));
            }
            if !parent_exists(&nodes, path) {
                return Err(not_found(path));
            }
            nodes.insert(path.to_path_buf(), Node::Directory);
            return Ok(());
        }
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() || ancestor.parent().is_none() {
                continue;
            }
            match nodes.get(ancestor) {
                Some(Node::File(_)) => {
                    return Err(io_error(ErrorKind::Other, "not a directory", ancestor))
                }
                Some(Node::Directory) => {}
                None => {
                    nodes.insert(ancestor.to_path_buf(), Node::Directory);
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
