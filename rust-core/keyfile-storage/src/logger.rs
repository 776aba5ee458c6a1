// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Debug and error sinks for engine output.
//
// The engine formats its own messages and hands finished strings to a
// `Logger`. By default both sinks forward to `tracing`; embedders can swap in
// their own closures to capture or redirect output.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::normalize::normalize;

/// A message sink.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Pair of sinks receiving debug and error messages.
#[derive(Clone)]
pub struct Logger {
    debug: LogSink,
    error: LogSink,
}

impl Logger {
    /// Build a logger from two closures.
    pub fn new<D, E>(debug: D, error: E) -> Self
    where
        D: Fn(&str) + Send + Sync + 'static,
        E: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            debug: Arc::new(debug),
            error: Arc::new(error),
        }
    }

    /// Emit on the debug sink. Gating on the `debug` flag is the caller's job.
    pub fn debug(&self, message: &str) {
        (self.debug)(message)
    }

    /// Emit on the error sink.
    pub fn error(&self, message: &str) {
        (self.error)(message)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(
            |message| tracing::debug!(target: "keyfile_storage", "{message}"),
            |message| tracing::error!(target: "keyfile_storage", "{message}"),
        )
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

/// Render a stored value for a debug trace, unwrapping nested JSON.
pub fn render_value(raw: &str) -> String {
    match normalize(raw) {
        Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| raw.to_string()),
    }
}
