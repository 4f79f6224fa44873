//! Fuzz target for callback URL routing.
//!
//! Tests that parsing and classifying arbitrary strings as wallet
//! callback URLs is handled safely.

#![no_main]

use courier_protocol::{classify, CallbackEvent};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Try to interpret input as a string
    if let Ok(s) = std::str::from_utf8(data) {
        // Attempt to parse as a callback URL
        // Should succeed for valid URLs, fail otherwise - never panic
        if let Ok(event) = CallbackEvent::parse(s) {
            // Classification and correlation extraction must not panic
            // on any parsed callback
            let _ = classify(&event);
            let _ = event.correlation();
        }
    }
});
