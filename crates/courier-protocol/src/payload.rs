//! Typed payloads sealed into authenticated envelopes.
//!
//! Every encrypted method carries a JSON payload. The payload is
//! serialized to UTF-8, sealed with XChaCha20-Poly1305 under a key
//! derived from the session's shared secret, and the resulting nonce
//! and ciphertext travel as separate base58 parameters.
//!
//! Opening distinguishes two failures: an envelope that fails
//! authentication (wrong or rotated key, tampering) and a payload that
//! decrypts but does not match the expected schema.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use courier_crypto::{open, seal, Envelope, SharedSecret, SymmetricKey};

use crate::error::{ProtocolError, Result};

/// Domain separator for payload encryption key derivation.
///
/// This context string is used when deriving the symmetric encryption
/// key from the ECDH shared secret. It ensures the derived key is
/// unique to deep-link payload encryption.
pub const PAYLOAD_ENCRYPTION_CONTEXT: &str = "courier deeplink payload v1";

/// Derive the payload encryption key for a session.
///
/// Both sides of the exchange derive the same key from the same shared
/// secret, so a key derived from a rotated keypair fails authentication
/// instead of producing garbage plaintext.
#[must_use]
pub fn payload_key(shared: &SharedSecret) -> SymmetricKey {
    SymmetricKey::from(shared.derive_key(PAYLOAD_ENCRYPTION_CONTEXT))
}

/// Seal a payload value under a session's shared secret.
///
/// # Errors
///
/// Returns `ProtocolError::Serialization` if the payload cannot be
/// serialized, or `ProtocolError::Crypto` if encryption fails.
pub fn seal_payload<T: Serialize>(shared: &SharedSecret, payload: &T) -> Result<Envelope> {
    let json =
        serde_json::to_vec(payload).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    Ok(seal(&payload_key(shared), &json)?)
}

/// Open an envelope and parse the payload it carries.
///
/// # Errors
///
/// Returns `ProtocolError::DecryptionFailed` if the envelope fails
/// authentication, or `ProtocolError::MalformedPayload` if the
/// plaintext is not valid JSON for the expected type.
pub fn open_payload<T: DeserializeOwned>(shared: &SharedSecret, envelope: &Envelope) -> Result<T> {
    let plaintext =
        open(&payload_key(shared), envelope).map_err(|_| ProtocolError::DecryptionFailed)?;
    serde_json::from_slice(&plaintext).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

/// Opaque session token issued by the wallet on connect.
///
/// The dapp never interprets the token; it is echoed back inside every
/// encrypted request payload so the wallet can identify the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wallet's on-chain address in base58 form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse an address, checking that it decodes to a 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::MalformedPayload` if the input is not
    /// base58 or does not decode to exactly 32 bytes.
    pub fn parse(address: &str) -> Result<Self> {
        let bytes = bs58::decode(address)
            .into_vec()
            .map_err(|_| ProtocolError::MalformedPayload("address is not base58".into()))?;
        if bytes.len() != 32 {
            return Err(ProtocolError::MalformedPayload(format!(
                "address decodes to {} bytes, expected 32",
                bytes.len()
            )));
        }
        Ok(Self(address.to_string()))
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==================== Request payloads (dapp -> wallet) ====================

/// Payload for `disconnect`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectRequest {
    /// The session being torn down.
    pub session: SessionToken,
}

/// Payload for `signAndSendTransaction`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAndSendTransactionRequest {
    /// The active session token.
    pub session: SessionToken,
    /// Base58-encoded serialized transaction.
    pub transaction: String,
}

/// Payload for `signAllTransactions`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAllTransactionsRequest {
    /// The active session token.
    pub session: SessionToken,
    /// Base58-encoded serialized transactions.
    pub transactions: Vec<String>,
}

/// Payload for `signTransaction`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignTransactionRequest {
    /// The active session token.
    pub session: SessionToken,
    /// Base58-encoded serialized transaction.
    pub transaction: String,
}

/// Payload for `signMessage`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageRequest {
    /// The active session token.
    pub session: SessionToken,
    /// Base58 encoding of the message's UTF-8 bytes.
    pub message: String,
}

// ==================== Response payloads (wallet -> dapp) ====================

/// Payload inside an `onConnect` callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
    /// The wallet's on-chain address, base58.
    pub public_key: String,
    /// The session token to echo in subsequent requests.
    pub session: SessionToken,
}

/// Payload inside an `onSignAndSendTransaction` callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAndSendTransactionResponse {
    /// Base58 signature of the submitted transaction.
    pub signature: String,
}

/// Payload inside an `onSignAllTransactions` callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAllTransactionsResponse {
    /// Base58-encoded signed transactions, in request order.
    pub transactions: Vec<String>,
}

/// Payload inside an `onSignTransaction` callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignTransactionResponse {
    /// Base58-encoded signed transaction.
    pub transaction: String,
}

/// Payload inside an `onSignMessage` callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageResponse {
    /// Base58 signature over the message bytes.
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_crypto::SessionKeyPair;

    fn shared_pair() -> (SharedSecret, SharedSecret) {
        let dapp = SessionKeyPair::generate();
        let wallet = SessionKeyPair::generate();
        (
            dapp.diffie_hellman(wallet.public()),
            wallet.diffie_hellman(dapp.public()),
        )
    }

    #[test]
    fn test_seal_open_typed_roundtrip() {
        let (dapp_shared, wallet_shared) = shared_pair();
        let request = SignMessageRequest {
            session: SessionToken::new("tok-123"),
            message: bs58::encode(b"hello wallet").into_string(),
        };

        let envelope = seal_payload(&dapp_shared, &request).unwrap();
        let opened: SignMessageRequest = open_payload(&wallet_shared, &envelope).unwrap();

        assert_eq!(opened, request);
    }

    #[test]
    fn test_open_with_wrong_secret_is_decryption_failure() {
        let (dapp_shared, _) = shared_pair();
        let (other_shared, _) = shared_pair();

        let envelope = seal_payload(
            &dapp_shared,
            &DisconnectRequest {
                session: SessionToken::new("tok-123"),
            },
        )
        .unwrap();

        let result: Result<DisconnectRequest> = open_payload(&other_shared, &envelope);
        assert!(matches!(result, Err(ProtocolError::DecryptionFailed)));
    }

    #[test]
    fn test_schema_mismatch_is_malformed_not_auth_failure() {
        let (dapp_shared, wallet_shared) = shared_pair();

        // Valid envelope, wrong shape inside
        let envelope = seal_payload(
            &dapp_shared,
            &serde_json::json!({ "unexpected": true }),
        )
        .unwrap();

        let result: Result<ConnectResponse> = open_payload(&wallet_shared, &envelope);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_payload_json_field_names() {
        let request = SignAndSendTransactionRequest {
            session: SessionToken::new("tok-123"),
            transaction: "3yZe7d".into(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["session"], "tok-123");
        assert_eq!(json["transaction"], "3yZe7d");
    }

    #[test]
    fn test_connect_response_parses_wire_json() {
        let raw = r#"{"public_key":"11111111111111111111111111111111","session":"tok-123"}"#;
        let response: ConnectResponse = serde_json::from_str(raw).unwrap();

        assert_eq!(response.session, SessionToken::new("tok-123"));
        assert_eq!(response.public_key, "11111111111111111111111111111111");
    }

    #[test]
    fn test_wallet_address_validation() {
        // 32 one-bytes in base58 (the system program address shape)
        let valid = bs58::encode([1u8; 32]).into_string();
        assert!(WalletAddress::parse(&valid).is_ok());

        assert!(matches!(
            WalletAddress::parse("not base58 0OIl"),
            Err(ProtocolError::MalformedPayload(_))
        ));
        let short = bs58::encode([1u8; 16]).into_string();
        assert!(matches!(
            WalletAddress::parse(&short),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_derived_payload_keys_match_across_sides() {
        let (dapp_shared, wallet_shared) = shared_pair();
        assert_eq!(
            payload_key(&dapp_shared).as_bytes(),
            payload_key(&wallet_shared).as_bytes()
        );
    }
}
