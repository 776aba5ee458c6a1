// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage error types for the keyfile engine.
//
// One enum covers every failure an engine operation can surface: the
// initialization gate settling to failure (or never having been started),
// hook failures, underlying I/O errors, content that does not fit the
// configured encoding, and the wrapped error handed to failure callbacks.

use thiserror::Error;

/// Error type returned by `before_init` / `after_init` hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when interacting with a storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The initialization task settled to failure. Terminal for the engine.
    #[error("storage initialization failed: {0}")]
    Initialization(String),

    /// No initialization task exists for this engine, or it vanished before
    /// settling.
    #[error("storage initialization was never started")]
    InitializationMissing,

    /// A lifecycle hook returned an error.
    #[error("{stage} hook failed: {message}")]
    Hook {
        /// Which hook failed (`beforeInit` or `afterInit`).
        stage: &'static str,
        /// The hook's error message.
        message: String,
    },

    /// An I/O error occurred in the underlying file system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path was not found by a provider that does not speak `std::io`.
    #[error("no such file or directory: {0}")]
    NotFound(String),

    /// Stored content does not fit the configured encoding.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A typed value could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Wrapped failure handed to `on_fail` callbacks, carrying the
    /// operation prefix and the underlying message.
    #[error("{0}")]
    Operation(String),
}

impl StorageError {
    /// True when the failure means "the path does not exist".
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            StorageError::NotFound(_) => true,
            _ => false,
        }
    }

    /// True for both flavours of initialization failure.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            StorageError::Initialization(_) | StorageError::InitializationMissing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::Io(io_err);
        assert!(err.to_string().contains("I/O error"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file gone");
        assert!(StorageError::Io(io_err).is_not_found());
        assert!(StorageError::NotFound("/tmp/x".into()).is_not_found());
        assert!(!StorageError::Encoding("bad".into()).is_not_found());
    }

    #[test]
    fn test_initialization_display() {
        let err = StorageError::Initialization("disk on fire".into());
        assert_eq!(err.to_string(), "storage initialization failed: disk on fire");
        assert!(err.is_initialization());
        assert!(StorageError::InitializationMissing.is_initialization());
        assert!(!StorageError::Operation("x".into()).is_initialization());
    }

    #[test]
    fn test_hook_display() {
        let err = StorageError::Hook {
            stage: "beforeInit",
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "beforeInit hook failed: boom");
    }

    #[test]
    fn test_serialization_display() {
        let err = StorageError::Serialization("bad json".to_string());
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn test_operation_display_is_verbatim() {
        let err = StorageError::Operation("Error getting item user-1: I/O error: denied".into());
        assert_eq!(err.to_string(), "Error getting item user-1: I/O error: denied");
    }
}
