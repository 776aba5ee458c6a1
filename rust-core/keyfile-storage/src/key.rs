// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key encoding for the keyfile engine.
//
// Each stored item lives in exactly one file whose name is derived from the
// item's key. The mapping is deterministic but lossy: every character outside
// `[A-Za-z0-9._-]` collapses to `-`, so `"a:b"` and `"a/b"` share the file
// `a-b`. Callers with adversarial or highly variable key sets should check
// `FileStorageEngine::file_path` for collisions before relying on it.
//
// A segment of `""`, `"."` or `".."` would name the storage directory or its
// parent, so those become `"-"`, `"-"` and `"--"`. They therefore share files
// with the literal keys `"-"` and `"--"`.

use std::borrow::Cow;

/// Character substituted for anything that is not path-safe.
pub const REPLACEMENT: char = '-';

/// True when `c` may appear verbatim in an encoded path segment.
fn is_path_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

/// Map an arbitrary key to a file-system-safe path segment.
///
/// ```rust
/// use keyfile_storage::key::encode_key;
///
/// assert_eq!(encode_key("user:1"), "user-1");
/// assert_eq!(encode_key("persist:root"), "persist-root");
/// assert_eq!(encode_key("plain_Key-1.json"), "plain_Key-1.json");
/// assert_eq!(encode_key(".."), "--");
/// ```
pub fn encode_key(key: &str) -> String {
    if is_reserved(key) {
        return REPLACEMENT.to_string().repeat(key.len().max(1));
    }
    key.chars()
        .map(|c| if is_path_safe(c) { c } else { REPLACEMENT })
        .collect()
}

/// True for segments that resolve to a directory rather than a file in it.
fn is_reserved(segment: &str) -> bool {
    matches!(segment, "" | "." | "..")
}

/// Turn a directory entry name back into a display key.
///
/// Names are percent-decoded; anything that does not decode to valid UTF-8
/// is returned unchanged.
pub fn decode_key(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => segment.to_string(),
    }
}
