// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for key encoding and debug-output normalization

#![no_main]

use keyfile_storage::key::{decode_key, encode_key};
use keyfile_storage::normalize::normalize;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Encoded segments never contain path separators.
        let encoded = encode_key(s);
        assert!(!encoded.contains('/') && !encoded.contains('\\'));
        assert!(!matches!(encoded.as_str(), "" | "." | ".."));
        if !s.is_empty() {
            assert_eq!(encoded.chars().count(), s.chars().count());
        }

        // Decoding arbitrary directory names must not panic.
        let _ = decode_key(s);

        // Deeply nested or malformed JSON must not panic.
        if s.len() < 4096 {
            let _ = normalize(s);
        }
    }
});
