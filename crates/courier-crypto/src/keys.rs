//! X25519 key agreement for deep-link sessions.
//!
//! Each connection attempt uses a fresh keypair. The dapp sends its
//! public key to the wallet in cleartext; the wallet answers with its
//! own public key, and both sides derive the same shared secret via
//! Diffie-Hellman.
//!
//! ## Security Notes
//!
//! - Secret keys are zeroized on drop
//! - Uses OsRng for key generation
//! - Shared secrets are zeroized on drop and never logged

use rand::rngs::OsRng;
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of an X25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an X25519 secret key in bytes.
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of a shared secret in bytes.
pub const SHARED_SECRET_SIZE: usize = 32;

/// X25519 public key for key exchange.
///
/// Public keys travel in cleartext deep-link parameters, so this type
/// is freely cloneable and printable.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_SIZE],
}

impl PublicKey {
    /// Create from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; PUBLIC_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    /// Convert to byte array.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.bytes
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

impl From<x25519_dalek::PublicKey> for PublicKey {
    fn from(key: x25519_dalek::PublicKey) -> Self {
        Self {
            bytes: key.to_bytes(),
        }
    }
}

impl From<&PublicKey> for x25519_dalek::PublicKey {
    fn from(key: &PublicKey) -> Self {
        x25519_dalek::PublicKey::from(key.bytes)
    }
}

/// X25519 secret key for key exchange.
///
/// Lives only for the span of one session: generated for a connection
/// attempt, used once to derive the shared secret, then dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; SECRET_KEY_SIZE],
}

impl SecretKey {
    /// Generate a new random secret key.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self {
            bytes: secret.to_bytes(),
        }
    }

    /// Create from raw bytes.
    ///
    /// # Security
    ///
    /// Only use bytes from a secure source.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SECRET_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; SECRET_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        let secret = StaticSecret::from(self.bytes);
        let public = x25519_dalek::PublicKey::from(&secret);
        PublicKey::from(public)
    }

    /// Perform Diffie-Hellman key exchange.
    ///
    /// Deterministic: the same key and peer always produce the same
    /// shared secret, and both sides of the exchange derive identical
    /// values.
    pub fn diffie_hellman(&self, peer_public: &PublicKey) -> SharedSecret {
        let secret = StaticSecret::from(self.bytes);
        let peer = x25519_dalek::PublicKey::from(peer_public);
        let shared = secret.diffie_hellman(&peer);
        SharedSecret {
            bytes: shared.to_bytes(),
        }
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

// SECURITY: Clone intentionally NOT implemented for SecretKey.
// Secret keys should not be cloneable to prevent accidental duplication
// of secret material in memory.

/// An X25519 keypair scoped to one connection attempt.
///
/// The two halves are created together and must be discarded together:
/// a shared secret derived from this pair is only valid while the pair
/// that produced it is the current one.
pub struct SessionKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl SessionKeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let secret = SecretKey::generate();
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Get the public key.
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    /// Perform Diffie-Hellman against the peer's public key.
    pub fn diffie_hellman(&self, peer_public: &PublicKey) -> SharedSecret {
        self.secret.diffie_hellman(peer_public)
    }
}

impl std::fmt::Debug for SessionKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKeyPair {{ public: {:?} }}", self.public)
    }
}

/// Shared secret derived from Diffie-Hellman key exchange.
///
/// This is the raw curve output. Use [`SharedSecret::derive_key`] to
/// turn it into an encryption key; don't use the bytes directly.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: [u8; SHARED_SECRET_SIZE],
}

impl SharedSecret {
    /// Get the shared secret as bytes.
    ///
    /// # Security
    ///
    /// Use this to derive actual encryption keys via a KDF.
    /// Don't use directly as an encryption key.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.bytes
    }

    /// Derive an encryption key using BLAKE3.
    ///
    /// Uses BLAKE3's key derivation mode with a context string.
    pub fn derive_key(&self, context: &str) -> [u8; 32] {
        blake3::derive_key(context, &self.bytes)
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let pair = SessionKeyPair::generate();

        assert_eq!(pair.public().as_bytes().len(), PUBLIC_KEY_SIZE);
    }

    #[test]
    fn test_key_exchange_is_symmetric() {
        let dapp = SessionKeyPair::generate();
        let wallet = SessionKeyPair::generate();

        // Both parties derive the same shared secret
        let dapp_shared = dapp.diffie_hellman(wallet.public());
        let wallet_shared = wallet.diffie_hellman(dapp.public());

        assert_eq!(dapp_shared.as_bytes(), wallet_shared.as_bytes());
    }

    #[test]
    fn test_key_exchange_is_deterministic() {
        let dapp = SessionKeyPair::generate();
        let wallet = SessionKeyPair::generate();

        let first = dapp.diffie_hellman(wallet.public());
        let second = dapp.diffie_hellman(wallet.public());

        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_different_peers_produce_different_secrets() {
        let dapp = SessionKeyPair::generate();
        let wallet_a = SessionKeyPair::generate();
        let wallet_b = SessionKeyPair::generate();

        let shared_a = dapp.diffie_hellman(wallet_a.public());
        let shared_b = dapp.diffie_hellman(wallet_b.public());

        assert_ne!(shared_a.as_bytes(), shared_b.as_bytes());
    }

    #[test]
    fn test_key_derivation_contexts() {
        let dapp = SessionKeyPair::generate();
        let wallet = SessionKeyPair::generate();

        let shared = dapp.diffie_hellman(wallet.public());

        let payload_key = shared.derive_key("payload v1");
        let other_key = shared.derive_key("other v1");

        // Different contexts produce different keys
        assert_ne!(payload_key, other_key);
    }

    #[test]
    fn test_public_key_serialization() {
        let pair = SessionKeyPair::generate();
        let public = pair.public();

        let bytes = public.to_bytes();
        let restored = PublicKey::from_bytes(&bytes).unwrap();

        assert_eq!(public, &restored);
    }

    #[test]
    fn test_secret_key_serialization() {
        let original = SecretKey::generate();
        let public = original.public_key();

        let restored = SecretKey::from_bytes(&original.bytes).unwrap();

        // Same public key means same secret key
        assert_eq!(restored.public_key(), public);
    }

    #[test]
    fn test_invalid_key_length() {
        let short = [0u8; 16];
        assert!(matches!(
            PublicKey::from_bytes(&short),
            Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_SIZE,
                actual: 16
            })
        ));
        assert!(SecretKey::from_bytes(&short).is_err());
    }

    #[test]
    fn test_debug_redacted() {
        let secret = SecretKey::generate();
        let shared = SharedSecret {
            bytes: [0u8; SHARED_SECRET_SIZE],
        };

        let secret_debug = format!("{:?}", secret);
        let shared_debug = format!("{:?}", shared);

        assert!(secret_debug.contains("REDACTED"));
        assert!(shared_debug.contains("REDACTED"));
    }

    #[test]
    fn test_public_key_debug() {
        let pair = SessionKeyPair::generate();
        let debug = format!("{:?}", pair.public());

        // Should show partial hex, not REDACTED
        assert!(debug.contains("PublicKey"));
        assert!(!debug.contains("REDACTED"));
    }
}
