// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Readiness gate for the keyfile engine.
//
// An engine is constructed synchronously but needs asynchronous setup (hooks,
// directory creation) before it can serve requests. `ReadinessGate::start`
// spawns that setup immediately on the ambient tokio runtime and keeps a
// `watch` receiver for its outcome. Every operation calls `wait_ready`
// first:
//
// - `Ready`   -> returns immediately.
// - `Pending` -> suspends until the setup task settles.
// - `Failed`  -> returns `StorageError::Initialization` with the recorded
//   message, forever.
//
// If no setup task is running (constructed outside a runtime, or the task
// was torn down before publishing a result) the channel closes while still
// `Pending` and waits fail with `StorageError::InitializationMissing`.

use std::future::Future;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Lifecycle of the initialization task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessState {
    Pending,
    Ready,
    /// Initialization failed; holds the triggering error's message.
    Failed(String),
}

impl ReadinessState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ReadinessState::Pending)
    }
}

/// Handle to a one-shot initialization task.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    state: watch::Receiver<ReadinessState>,
}

impl ReadinessGate {
    /// Spawn `init` now and return a gate tracking its outcome.
    ///
    /// Must be called from within a tokio runtime for the task to start;
    /// otherwise the gate is created without one and every wait fails with
    /// [`StorageError::InitializationMissing`].
    pub fn start<F>(init: F) -> Self
    where
        F: Future<Output = Result<(), StorageError>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(ReadinessState::Pending);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let settled = match init.await {
                        Ok(()) => ReadinessState::Ready,
                        Err(err) => ReadinessState::Failed(err.to_string()),
                    };
                    debug!(state = ?settled, "storage initialization settled");
                    // Nobody listening is fine; the engine was dropped.
                    let _ = tx.send(settled);
                });
            }
            Err(_) => {
                warn!("no tokio runtime available; storage initialization not started");
                drop(tx);
            }
        }
        Self { state: rx }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ReadinessState {
        self.state.borrow().clone()
    }

    /// Block until initialization has settled, failing if it did not reach
    /// `Ready`.
    pub async fn wait_ready(&self) -> Result<(), StorageError> {
        let mut rx = self.state.clone();
        let settled = rx
            .wait_for(|state| !state.is_pending())
            .await
            .map_err(|_| StorageError::InitializationMissing)?;
        match &*settled {
            ReadinessState::Ready => Ok(()),
            ReadinessState::Failed(message) => Err(StorageError::Initialization(message.clone())),
            ReadinessState::Pending => Err(StorageError::InitializationMissing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_successful_init_becomes_ready() {
        let gate = ReadinessGate::start(async { Ok(()) });
        gate.wait_ready().await.unwrap();
        assert_eq!(gate.state(), ReadinessState::Ready);
        // Later waits are immediate.
        gate.wait_ready().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_init_is_terminal() {
        let gate = ReadinessGate::start(async { Err(StorageError::Encoding("bad".into())) });

        let err = gate.wait_ready().await.unwrap_err();
        assert!(matches!(err, StorageError::Initialization(ref msg) if msg.contains("bad")));
        assert!(matches!(gate.state(), ReadinessState::Failed(_)));

        // Every subsequent wait fails too.
        assert!(gate.wait_ready().await.unwrap_err().is_initialization());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_block_while_pending() {
        let gate = ReadinessGate::start(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });
        assert!(gate.state().is_pending());

        let finished = Arc::new(AtomicUsize::new(0));
        let mut waiters = Vec::new();
        for _ in 0..3 {
            let gate = gate.clone();
            let finished = Arc::clone(&finished);
            waiters.push(tokio::spawn(async move {
                gate.wait_ready().await.unwrap();
                finished.fetch_add(1, Ordering::SeqCst);
            }));
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert!(gate.state().is_pending());

        for waiter in waiters {
            waiter.await.unwrap();
        }
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert_eq!(gate.state(), ReadinessState::Ready);
    }

    #[test]
    fn test_without_runtime_wait_reports_missing_task() {
        let gate = ReadinessGate::start(async { Ok(()) });
        assert!(gate.state().is_pending());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let err = runtime.block_on(gate.wait_ready()).unwrap_err();
        assert!(matches!(err, StorageError::InitializationMissing));
    }

    #[tokio::test]
    async fn test_panicking_init_reports_missing_task() {
        let gate = ReadinessGate::start(async {
            if true {
                panic!("init blew up");
            }
            Ok(())
        });
        let err = gate.wait_ready().await.unwrap_err();
        assert!(matches!(err, StorageError::InitializationMissing));
    }
}
