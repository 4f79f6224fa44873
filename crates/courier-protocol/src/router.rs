//! Inbound callback parsing, classification, and decryption.
//!
//! The wallet answers every request by opening a callback URL. Routing
//! happens in a fixed order:
//!
//! 1. **Error first**: a callback carrying `errorCode` is a remote
//!    error. It is surfaced verbatim and nothing is decrypted.
//! 2. **Classify**: the method token (final path segment, or the host
//!    for bare custom-scheme URLs) is matched exactly against the
//!    callback token table. A peer-supplied "method" parameter is never
//!    consulted.
//! 3. **Open**: `onConnect` derives the shared secret from the pending
//!    attempt's keypair and the wallet's cleartext public key, then
//!    opens the envelope with the freshly derived secret. Other
//!    methods open with the current session's secret. `onDisconnect`
//!    is an acknowledgement and carries nothing to decrypt.
//!
//! ## Security Notes
//!
//! - The wallet's public key arrives in an attacker-controllable
//!   parameter. It is screened against known low-order curve points
//!   before any key derivation.
//! - An envelope that fails authentication surfaces as
//!   `AuthenticationFailed`, distinct from a schema mismatch after a
//!   successful decryption.

use url::Url;

use courier_crypto::{Envelope, Nonce, PublicKey, SessionKeyPair, SharedSecret};

use crate::error::{ProtocolError, Result};
use crate::method::Method;
use crate::payload::{
    open_payload, ConnectResponse, SessionToken, SignAllTransactionsResponse,
    SignAndSendTransactionResponse, SignMessageResponse, SignTransactionResponse, WalletAddress,
};
use crate::request::CorrelationId;

/// Known low-order points on Curve25519 that must be rejected.
///
/// These points have small order and using them in ECDH will result in
/// a zero or predictable shared secret, compromising security.
const LOW_ORDER_POINTS: [[u8; 32]; 8] = [
    // Point at infinity (order 1)
    [
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0,
    ],
    // Point of order 8
    [
        1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0,
    ],
    // Other low-order points (orders 2, 4, 8)
    [
        0xe0, 0xeb, 0x7a, 0x7c, 0x3b, 0x41, 0xb8, 0xae, 0x16, 0x56, 0xe3, 0xfa, 0xf1, 0x9f, 0xc4,
        0x6a, 0xda, 0x09, 0x8d, 0xeb, 0x9c, 0x32, 0xb1, 0xfd, 0x86, 0x62, 0x05, 0x16, 0x5f, 0x49,
        0xb8, 0x00,
    ],
    [
        0x5f, 0x9c, 0x95, 0xbc, 0xa3, 0x50, 0x8c, 0x24, 0xb1, 0xd0, 0xb1, 0x55, 0x9c, 0x83, 0xef,
        0x5b, 0x04, 0x44, 0x5c, 0xc4, 0x58, 0x1c, 0x8e, 0x86, 0xd8, 0x22, 0x4e, 0xdd, 0xd0, 0x9f,
        0x11, 0x57,
    ],
    [
        0xec, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0x7f,
    ],
    [
        0xed, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0x7f,
    ],
    [
        0xee, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0x7f,
    ],
    // Non-canonical point (x >= p, the field prime)
    [
        0xed, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff,
    ],
];

/// Validate the wallet's encryption public key.
///
/// Checks:
/// - Key is not all zeros
/// - Key is not a low-order point (which would result in a zero or
///   predictable shared secret)
///
/// This validation happens BEFORE any cryptographic operations. Uses
/// constant-time comparison for the low-order point checks.
fn validate_peer_key(key: &[u8; 32]) -> Result<()> {
    use subtle::ConstantTimeEq;

    // Check for all-zeros key
    // This is also caught by low-order check, but explicit check is clearer
    let is_zero = key.iter().all(|&b| b == 0);
    if is_zero {
        return Err(ProtocolError::InvalidPeerKey);
    }

    // Check against known low-order points using constant-time comparison
    // to prevent timing attacks that could reveal information about the key
    for low_order in &LOW_ORDER_POINTS {
        if bool::from(key.ct_eq(low_order)) {
            return Err(ProtocolError::InvalidPeerKey);
        }
    }

    Ok(())
}

/// A callback URL broken into its method token and query parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackEvent {
    /// The method token extracted from the URL.
    pub token: String,
    /// Query parameters, in URL order.
    pub params: Vec<(String, String)>,
}

impl CallbackEvent {
    /// Break a parsed URL into a callback event.
    ///
    /// The token is the final non-empty path segment; bare
    /// custom-scheme URLs (`dapp://onConnect?...`) fall back to the
    /// host. Never fails: an unclassifiable URL produces an event
    /// whose token matches no method.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let token = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .or_else(|| url.host_str().map(str::to_string))
            .unwrap_or_default();
        let params = url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Self { token, params }
    }

    /// Parse a raw URL string into a callback event.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::MalformedUrl` if the input is not a
    /// valid URL.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| ProtocolError::MalformedUrl(e.to_string()))?;
        Ok(Self::from_url(&url))
    }

    /// Look up a query parameter by name. First occurrence wins.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value.as_str())
    }

    /// Extract the correlation id, if the callback carries one.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidEncoding` if a `request_id`
    /// parameter is present but undecodable.
    pub fn correlation(&self) -> Result<Option<CorrelationId>> {
        match self.param("request_id") {
            None => Ok(None),
            Some(value) => CorrelationId::from_base58(value).map(Some),
        }
    }
}

/// Key material available for opening a callback.
///
/// Mirrors the connection lifecycle: at any moment there is at most a
/// pending attempt keypair or an established session secret.
#[derive(Debug)]
pub enum RouteKeys<'a> {
    /// No attempt or session exists.
    None,
    /// A connect attempt is outstanding.
    Connecting {
        /// The attempt's keypair, used to derive the session secret.
        keypair: &'a SessionKeyPair,
    },
    /// An active session exists.
    Connected {
        /// The session's shared secret.
        shared: &'a SharedSecret,
    },
}

/// A routed, decrypted wallet callback.
#[derive(Debug)]
pub enum WalletEvent {
    /// Wallet accepted the connection.
    Connected {
        /// The freshly derived session secret.
        shared_secret: SharedSecret,
        /// The session token to echo in subsequent requests.
        session: SessionToken,
        /// The wallet's on-chain address.
        address: WalletAddress,
    },
    /// Wallet acknowledged a disconnect.
    Disconnected,
    /// Transaction signed and submitted; the network signature.
    TransactionSent {
        /// Base58 transaction signature.
        signature: String,
    },
    /// Batch of transactions signed.
    TransactionsSigned {
        /// Base58-encoded signed transactions, in request order.
        transactions: Vec<String>,
    },
    /// Single transaction signed.
    TransactionSigned {
        /// Base58-encoded signed transaction.
        transaction: String,
    },
    /// Message signed.
    MessageSigned {
        /// Base58 signature over the message bytes.
        signature: String,
    },
}

/// Classify a callback event, surfacing remote errors first.
///
/// # Errors
///
/// Returns `ProtocolError::Remote` if the callback carries an
/// `errorCode` parameter, or `ProtocolError::UnknownMethod` if the
/// token matches no known method.
pub fn classify(event: &CallbackEvent) -> Result<Method> {
    if let Some(code) = event.param("errorCode") {
        return Err(ProtocolError::Remote {
            code: code.to_string(),
            message: event.param("errorMessage").map(str::to_string),
        });
    }

    Method::from_callback_token(&event.token).ok_or_else(|| ProtocolError::UnknownMethod {
        token: event.token.clone(),
    })
}

/// Open a classified callback with the available key material.
///
/// # Errors
///
/// Returns `ProtocolError::NoActiveSession` if the required key
/// material is absent, `ProtocolError::AuthenticationFailed` if the
/// envelope fails authentication, and `ProtocolError::MalformedPayload`
/// if the plaintext does not match the method's response schema.
pub fn open_callback(
    method: Method,
    event: &CallbackEvent,
    keys: RouteKeys<'_>,
) -> Result<WalletEvent> {
    match method {
        Method::Connect => open_connect(event, keys),
        // An acknowledgement: carries no encrypted payload
        Method::Disconnect => Ok(WalletEvent::Disconnected),
        Method::SignAndSendTransaction => {
            let response: SignAndSendTransactionResponse = open_with_session(event, keys)?;
            Ok(WalletEvent::TransactionSent {
                signature: response.signature,
            })
        }
        Method::SignAllTransactions => {
            let response: SignAllTransactionsResponse = open_with_session(event, keys)?;
            Ok(WalletEvent::TransactionsSigned {
                transactions: response.transactions,
            })
        }
        Method::SignTransaction => {
            let response: SignTransactionResponse = open_with_session(event, keys)?;
            Ok(WalletEvent::TransactionSigned {
                transaction: response.transaction,
            })
        }
        Method::SignMessage => {
            let response: SignMessageResponse = open_with_session(event, keys)?;
            Ok(WalletEvent::MessageSigned {
                signature: response.signature,
            })
        }
    }
}

fn open_connect(event: &CallbackEvent, keys: RouteKeys<'_>) -> Result<WalletEvent> {
    let keypair = match keys {
        RouteKeys::Connecting { keypair } => keypair,
        _ => return Err(ProtocolError::NoActiveSession),
    };

    let peer_bytes = decode_param(event, "wallet_encryption_public_key")?;
    let peer = PublicKey::from_bytes(&peer_bytes)?;
    validate_peer_key(peer.as_bytes())?;

    // The secret is derived from the attempt's keypair, not any prior
    // session material
    let shared = keypair.diffie_hellman(&peer);

    let envelope = envelope_from_params(event)?;
    let response: ConnectResponse =
        open_payload(&shared, &envelope).map_err(auth_failure)?;

    let address = WalletAddress::parse(&response.public_key)?;
    Ok(WalletEvent::Connected {
        shared_secret: shared,
        session: response.session,
        address,
    })
}

fn open_with_session<T: serde::de::DeserializeOwned>(
    event: &CallbackEvent,
    keys: RouteKeys<'_>,
) -> Result<T> {
    let shared = match keys {
        RouteKeys::Connected { shared } => shared,
        _ => return Err(ProtocolError::NoActiveSession),
    };

    let envelope = envelope_from_params(event)?;
    open_payload(shared, &envelope).map_err(auth_failure)
}

fn envelope_from_params(event: &CallbackEvent) -> Result<Envelope> {
    let nonce_bytes = decode_param(event, "nonce")?;
    let ciphertext = decode_param(event, "data")?;
    let nonce = Nonce::from_bytes(&nonce_bytes)?;
    Ok(Envelope { nonce, ciphertext })
}

fn decode_param(event: &CallbackEvent, name: &str) -> Result<Vec<u8>> {
    let value = event
        .param(name)
        .ok_or_else(|| ProtocolError::MissingParameter { name: name.into() })?;
    bs58::decode(value)
        .into_vec()
        .map_err(|_| ProtocolError::InvalidEncoding { param: name.into() })
}

fn auth_failure(error: ProtocolError) -> ProtocolError {
    match error {
        ProtocolError::DecryptionFailed => ProtocolError::AuthenticationFailed,
        other => other,
    }
}
