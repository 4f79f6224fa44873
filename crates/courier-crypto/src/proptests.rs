//! Property-based tests for cryptographic primitives.
//!
//! These tests use proptest to verify cryptographic properties hold
//! for arbitrary inputs. They focus on:
//!
//! - Roundtrip properties (seal/open, serialize/deserialize)
//! - Uniqueness properties (keys, nonces)
//! - Consistency properties (same input produces same output)
//! - Error handling properties (invalid inputs are rejected)

use proptest::prelude::*;

use crate::sealed::{KEY_SIZE, NONCE_SIZE};
use crate::{open, seal, Envelope, Nonce, PublicKey, SecretKey, SessionKeyPair, SymmetricKey};

// ==================== Sealed Envelope Property Tests ====================

proptest! {
    /// Sealing followed by opening should return the original plaintext.
    #[test]
    fn seal_open_roundtrip(plaintext: Vec<u8>) {
        let key = SymmetricKey::generate();
        let envelope = seal(&key, &plaintext).unwrap();
        let decrypted = open(&key, &envelope).unwrap();
        prop_assert_eq!(plaintext, decrypted);
    }

    /// Opening with the wrong key should fail.
    #[test]
    fn open_wrong_key_fails(plaintext in prop::collection::vec(any::<u8>(), 1..100)) {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();

        let envelope = seal(&key1, &plaintext).unwrap();
        let result = open(&key2, &envelope);

        prop_assert!(result.is_err());
    }

    /// Flipping any ciphertext byte should fail authentication.
    #[test]
    fn tampered_ciphertext_fails(
        plaintext in prop::collection::vec(any::<u8>(), 1..100),
        flip in any::<prop::sample::Index>()
    ) {
        let key = SymmetricKey::generate();
        let mut envelope = seal(&key, &plaintext).unwrap();

        let idx = flip.index(envelope.ciphertext.len());
        envelope.ciphertext[idx] ^= 0xFF;

        prop_assert!(open(&key, &envelope).is_err());
    }

    /// Multiple seals of the same plaintext should produce different
    /// ciphertexts (due to random nonces).
    #[test]
    fn same_plaintext_different_ciphertext(plaintext in prop::collection::vec(any::<u8>(), 1..100)) {
        let key = SymmetricKey::generate();

        let envelope1 = seal(&key, &plaintext).unwrap();
        let envelope2 = seal(&key, &plaintext).unwrap();

        // Nonces should be different (random)
        prop_assert_ne!(envelope1.nonce.as_bytes(), envelope2.nonce.as_bytes());
        // Ciphertexts should be different (due to different nonces)
        prop_assert_ne!(envelope1.ciphertext, envelope2.ciphertext);
    }

    /// Envelope serialization/deserialization roundtrip.
    #[test]
    fn envelope_bytes_roundtrip(plaintext in prop::collection::vec(any::<u8>(), 0..1000)) {
        let key = SymmetricKey::generate();
        let envelope = seal(&key, &plaintext).unwrap();

        let bytes = envelope.to_bytes();
        let restored = Envelope::from_bytes(&bytes).unwrap();

        prop_assert_eq!(envelope.nonce.as_bytes(), restored.nonce.as_bytes());
        prop_assert_eq!(&envelope.ciphertext, &restored.ciphertext);

        // Should still decrypt correctly
        let decrypted = open(&key, &restored).unwrap();
        prop_assert_eq!(plaintext, decrypted);
    }

    /// SymmetricKey from_bytes/as_bytes roundtrip.
    #[test]
    fn symmetric_key_bytes_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let key = SymmetricKey::from_bytes(&bytes).unwrap();
        prop_assert_eq!(key.as_bytes(), &bytes);
    }

    /// Invalid key length should fail.
    #[test]
    fn symmetric_key_invalid_length(bytes in prop::collection::vec(any::<u8>(), 0..100)) {
        prop_assume!(bytes.len() != KEY_SIZE);

        let result = SymmetricKey::from_bytes(&bytes);
        prop_assert!(result.is_err());
    }

    /// Nonce from_bytes/as_bytes roundtrip.
    #[test]
    fn nonce_bytes_roundtrip(bytes in prop::collection::vec(any::<u8>(), NONCE_SIZE..=NONCE_SIZE)) {
        let nonce = Nonce::from_bytes(&bytes).unwrap();
        prop_assert_eq!(nonce.as_bytes().as_slice(), bytes.as_slice());
    }

    /// Invalid nonce length should fail.
    #[test]
    fn nonce_invalid_length(bytes in prop::collection::vec(any::<u8>(), 0..100)) {
        prop_assume!(bytes.len() != NONCE_SIZE);

        let result = Nonce::from_bytes(&bytes);
        prop_assert!(result.is_err());
    }
}

// ==================== Key Agreement Property Tests ====================

proptest! {
    /// Both sides of a key exchange derive the same secret, and the
    /// derived secret seals payloads each side can open.
    #[test]
    fn key_exchange_end_to_end(plaintext in prop::collection::vec(any::<u8>(), 0..200)) {
        let dapp = SessionKeyPair::generate();
        let wallet = SessionKeyPair::generate();

        let dapp_shared = dapp.diffie_hellman(wallet.public());
        let wallet_shared = wallet.diffie_hellman(dapp.public());

        prop_assert_eq!(dapp_shared.as_bytes(), wallet_shared.as_bytes());

        let seal_key = SymmetricKey::from(dapp_shared.derive_key("proptest v1"));
        let open_key = SymmetricKey::from(wallet_shared.derive_key("proptest v1"));

        let envelope = seal(&seal_key, &plaintext).unwrap();
        let decrypted = open(&open_key, &envelope).unwrap();
        prop_assert_eq!(plaintext, decrypted);
    }

    /// Opening with a secret derived from a different keypair fails.
    #[test]
    fn rotated_keypair_cannot_open(plaintext in prop::collection::vec(any::<u8>(), 1..200)) {
        let wallet = SessionKeyPair::generate();
        let old_pair = SessionKeyPair::generate();
        let new_pair = SessionKeyPair::generate();

        let old_key = SymmetricKey::from(
            old_pair.diffie_hellman(wallet.public()).derive_key("proptest v1"),
        );
        let new_key = SymmetricKey::from(
            new_pair.diffie_hellman(wallet.public()).derive_key("proptest v1"),
        );

        let envelope = seal(&old_key, &plaintext).unwrap();
        prop_assert!(open(&new_key, &envelope).is_err());
    }

    /// SecretKey restored from the same bytes derives the same public key.
    #[test]
    fn secret_key_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let a = SecretKey::from_bytes(&bytes).unwrap();
        let b = SecretKey::from_bytes(&bytes).unwrap();
        prop_assert_eq!(a.public_key(), b.public_key());
    }

    /// Public keys of invalid length are rejected.
    #[test]
    fn public_key_invalid_length(bytes in prop::collection::vec(any::<u8>(), 0..100)) {
        prop_assume!(bytes.len() != 32);

        prop_assert!(PublicKey::from_bytes(&bytes).is_err());
    }
}
