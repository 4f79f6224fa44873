//! Outbound deep-link request construction.
//!
//! A request is an ordered list of query parameters attached to the
//! wallet's deep-link base under the method's path segment. Two shapes
//! exist:
//!
//! - `connect` travels entirely in cleartext: the dapp's ephemeral
//!   public key, the target cluster, the dapp's identifying URL, and
//!   the redirect link. No shared secret exists yet.
//! - Every other method carries its payload sealed: the cleartext
//!   parameters are the dapp's public key, the envelope nonce, the
//!   redirect link, and the base58 ciphertext.
//!
//! The redirect link of every request carries a fresh correlation id,
//! echoed back by the wallet, so stale callbacks from abandoned
//! requests can be rejected.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use url::Url;

use courier_crypto::{PublicKey, SharedSecret};

use crate::error::{ProtocolError, Result};
use crate::method::Method;
use crate::payload::seal_payload;

/// Size of a correlation id in bytes.
pub const CORRELATION_ID_SIZE: usize = 16;

/// Random identifier tying a callback to the request that asked for it.
///
/// Generated fresh for every outbound request and appended to the
/// redirect link as the `request_id` parameter. A callback whose id
/// does not match the outstanding request is stale and must not be
/// acted on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorrelationId {
    bytes: [u8; CORRELATION_ID_SIZE],
}

impl CorrelationId {
    /// Generate a new random correlation id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; CORRELATION_ID_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Encode as base58 for URL transport.
    #[must_use]
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.bytes).into_string()
    }

    /// Decode from the base58 form.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidEncoding` if the input is not
    /// base58 or has the wrong length.
    pub fn from_base58(encoded: &str) -> Result<Self> {
        let bytes = bs58::decode(encoded).into_vec().map_err(|_| {
            ProtocolError::InvalidEncoding {
                param: "request_id".into(),
            }
        })?;
        if bytes.len() != CORRELATION_ID_SIZE {
            return Err(ProtocolError::InvalidEncoding {
                param: "request_id".into(),
            });
        }
        let mut arr = [0u8; CORRELATION_ID_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self { bytes: arr })
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

/// An outbound request: a method plus its ordered query parameters.
///
/// The parameter order is part of the wire shape and is preserved when
/// the descriptor is turned into a URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// The method being requested.
    pub method: Method,
    /// Query parameters, in wire order.
    pub params: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Assemble the deep-link URL for this request.
    ///
    /// `wallet_base` is the wallet's deep-link base, either a custom
    /// scheme (`wallet://v1/`) or a universal link
    /// (`https://wallet.example/ul/v1/`). It must end with a slash so
    /// the method path segment joins under it.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::MalformedUrl` if the base cannot be
    /// joined with the method path.
    pub fn to_url(&self, wallet_base: &Url) -> Result<Url> {
        let mut url = wallet_base
            .join(self.method.path_segment())
            .map_err(|e| ProtocolError::MalformedUrl(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.params {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

/// Build the per-method callback URL the wallet redirects back to.
///
/// The correlation id rides along as the `request_id` parameter.
///
/// # Errors
///
/// Returns `ProtocolError::MalformedUrl` if the redirect base cannot
/// be joined with the callback token.
pub fn redirect_link(
    redirect_base: &Url,
    method: Method,
    correlation: &CorrelationId,
) -> Result<Url> {
    let mut url = redirect_base
        .join(method.callback_token())
        .map_err(|e| ProtocolError::MalformedUrl(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("request_id", &correlation.to_base58());
    Ok(url)
}

/// Build a `connect` request.
///
/// The dapp's public key is deliberately cleartext: it is the first
/// half of the key exchange. The secret key never appears in any
/// parameter.
pub fn connect_request(
    dapp_public: &PublicKey,
    cluster: &str,
    app_url: &str,
    redirect: &Url,
) -> RequestDescriptor {
    RequestDescriptor {
        method: Method::Connect,
        params: vec![
            (
                "dapp_encryption_public_key".into(),
                bs58::encode(dapp_public.as_bytes()).into_string(),
            ),
            ("cluster".into(), cluster.into()),
            ("app_url".into(), app_url.into()),
            ("redirect_link".into(), redirect.to_string()),
        ],
    }
}

/// Build an encrypted request for any method other than `connect`.
///
/// Seals the payload under the session's shared secret. A fresh nonce
/// is generated per call, so re-sending the same logical request
/// produces a different URL that decrypts identically.
///
/// # Errors
///
/// Returns `ProtocolError::Serialization` if the payload cannot be
/// serialized, or `ProtocolError::Crypto` if encryption fails.
pub fn encrypted_request<T: Serialize>(
    method: Method,
    dapp_public: &PublicKey,
    shared: &SharedSecret,
    payload: &T,
    redirect: &Url,
) -> Result<RequestDescriptor> {
    let envelope = seal_payload(shared, payload)?;
    Ok(RequestDescriptor {
        method,
        params: vec![
            (
                "dapp_encryption_public_key".into(),
                bs58::encode(dapp_public.as_bytes()).into_string(),
            ),
            (
                "nonce".into(),
                bs58::encode(envelope.nonce.as_bytes()).into_string(),
            ),
            ("redirect_link".into(), redirect.to_string()),
            (
                "payload".into(),
                bs58::encode(&envelope.ciphertext).into_string(),
            ),
        ],
    })
}
