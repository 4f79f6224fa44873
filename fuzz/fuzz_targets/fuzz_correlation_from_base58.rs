//! Fuzz target for CorrelationId::from_base58.
//!
//! Tests that parsing arbitrary strings as correlation ids is handled safely.

#![no_main]

use courier_protocol::CorrelationId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Try to interpret input as a string
    if let Ok(s) = std::str::from_utf8(data) {
        // Attempt to parse as a correlation id
        // Should succeed for base58 of exactly 16 bytes, fail otherwise - never panic
        let result = CorrelationId::from_base58(s);

        // If successful, verify roundtrip
        if let Ok(id) = result {
            let encoded = id.to_base58();
            let roundtrip = CorrelationId::from_base58(&encoded).unwrap();
            assert_eq!(id, roundtrip);
        }
    }
});
