//! # courier-crypto
//!
//! Cryptographic primitives for the courier deep-link session protocol:
//! - **X25519** for per-session key agreement
//! - **XChaCha20-Poly1305** for authenticated payload encryption
//! - **BLAKE3** for deriving encryption keys from shared secrets
//!
//! ## Security
//!
//! All secret data uses `zeroize` for secure memory cleanup.
//! Secret types have redacted `Debug` output so they cannot leak
//! through logging.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keys;
pub mod sealed;

#[cfg(test)]
mod proptests;

pub use error::{CryptoError, Result};
pub use keys::{PublicKey, SecretKey, SessionKeyPair, SharedSecret};
pub use sealed::{open, seal, Envelope, Nonce, SymmetricKey};
