//! Fuzz target for Envelope::from_bytes.
//!
//! Tests that parsing arbitrary bytes as a sealed envelope is handled safely.

#![no_main]

use courier_crypto::Envelope;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Attempt to parse bytes as an Envelope
    // Should succeed for valid format, fail otherwise - never panic
    let result = Envelope::from_bytes(data);

    // If successful, verify basic properties
    if let Ok(envelope) = result {
        // Nonce should be 24 bytes
        assert_eq!(envelope.nonce.as_bytes().len(), 24);

        // Length should be correct
        let expected_len = 24 + envelope.ciphertext.len();
        assert_eq!(envelope.len(), expected_len);

        // Roundtrip through to_bytes
        let bytes = envelope.to_bytes();
        let roundtrip = Envelope::from_bytes(&bytes).unwrap();
        assert_eq!(envelope.nonce.as_bytes(), roundtrip.nonce.as_bytes());
        assert_eq!(envelope.ciphertext, roundtrip.ciphertext);
    }
});
