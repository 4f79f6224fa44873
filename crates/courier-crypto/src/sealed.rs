//! XChaCha20-Poly1305 sealed envelopes.
//!
//! Provides AEAD encryption with 256-bit keys and 192-bit nonces. Every
//! payload that crosses the deep-link boundary travels inside an
//! [`Envelope`]: a fresh random nonce plus ciphertext with the
//! authentication tag appended.
//!
//! ## Security Notes
//!
//! - Keys are zeroized on drop
//! - Nonces are randomly generated using OsRng
//! - Decryption under the wrong key fails authentication instead of
//!   producing garbage plaintext
//! - NEVER reuse a nonce with the same key

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of symmetric key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of nonce in bytes (192 bits for XChaCha20).
pub const NONCE_SIZE: usize = 24;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key for XChaCha20-Poly1305 encryption.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generate a new random symmetric key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as a byte slice.
    ///
    /// # Security
    ///
    /// Be careful with this - avoid logging or persisting the returned bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl From<[u8; KEY_SIZE]> for SymmetricKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// A 192-bit nonce for XChaCha20-Poly1305.
#[derive(Clone)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// Generate a new random nonce.
    ///
    /// The 192-bit space makes a collision under one key negligible,
    /// though not impossible; random generation is safe here where a
    /// 96-bit nonce would demand a counter.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a nonce from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 24 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the nonce as a byte slice.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

/// An encrypted payload plus the nonce that sealed it.
///
/// The two halves travel as separate deep-link parameters, so the
/// struct keeps them separate rather than concatenating up front.
#[derive(Clone)]
pub struct Envelope {
    /// The nonce used for encryption.
    pub nonce: Nonce,
    /// The ciphertext with authentication tag appended.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Get the total size of the envelope.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// Check if the envelope is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Serialize to bytes (nonce || ciphertext).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.len());
        result.extend_from_slice(self.nonce.as_bytes());
        result.extend_from_slice(&self.ciphertext);
        result
    }

    /// Deserialize from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is too short to contain a nonce
    /// and an authentication tag.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decryption);
        }
        let nonce = Nonce::from_bytes(&bytes[..NONCE_SIZE])?;
        let ciphertext = bytes[NONCE_SIZE..].to_vec();
        Ok(Self { nonce, ciphertext })
    }
}

/// Seal plaintext into an envelope using XChaCha20-Poly1305.
///
/// A fresh random nonce is generated for every call, so sealing the
/// same plaintext twice produces different envelopes that decrypt to
/// the same bytes.
///
/// # Example
///
/// ```
/// use courier_crypto::sealed::{open, seal, SymmetricKey};
///
/// let key = SymmetricKey::generate();
/// let plaintext = b"{\"session\":\"tok\"}";
///
/// let envelope = seal(&key, plaintext).unwrap();
/// let decrypted = open(&key, &envelope).unwrap();
///
/// assert_eq!(plaintext.as_slice(), decrypted.as_slice());
/// ```
pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<Envelope> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::generate();
    let xnonce = XNonce::from_slice(nonce.as_bytes());

    let ciphertext = cipher
        .encrypt(xnonce, plaintext)
        .map_err(|_| CryptoError::Encryption("XChaCha20-Poly1305 encryption failed".into()))?;

    Ok(Envelope { nonce, ciphertext })
}

/// Open an envelope using XChaCha20-Poly1305.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` if:
/// - The ciphertext or nonce has been tampered with
/// - The wrong key is used
/// - The ciphertext format is invalid
pub fn open(key: &SymmetricKey, envelope: &Envelope) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let xnonce = XNonce::from_slice(envelope.nonce.as_bytes());

    cipher
        .decrypt(xnonce, envelope.ciphertext.as_ref())
        .map_err(|_| CryptoError::Decryption)
}
