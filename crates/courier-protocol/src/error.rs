//! Error types for protocol operations.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Cryptographic operation failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] courier_crypto::CryptoError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Decryption failed (wrong key or tampered envelope).
    #[error("Failed to decrypt payload")]
    DecryptionFailed,

    /// Payload decrypted but did not match the expected schema.
    ///
    /// Kept separate from [`ProtocolError::DecryptionFailed`] so callers
    /// can tell a session-identity problem from a peer speaking a
    /// different payload version.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Callback token does not name a known method.
    #[error("Unknown callback method: {token}")]
    UnknownMethod {
        /// The unrecognized token.
        token: String,
    },

    /// No pending attempt or active session to decrypt against.
    #[error("No active session for encrypted callback")]
    NoActiveSession,

    /// Callback payload failed authentication under the session key.
    #[error("Callback payload failed authentication")]
    AuthenticationFailed,

    /// The wallet answered with an error instead of a payload.
    #[error("Wallet returned error {code}: {}", message.as_deref().unwrap_or("unspecified"))]
    Remote {
        /// Error code, verbatim from the callback.
        code: String,
        /// Human-readable message, if the wallet sent one.
        message: Option<String>,
    },

    /// A required callback parameter is missing.
    #[error("Missing callback parameter: {name}")]
    MissingParameter {
        /// Name of the missing parameter.
        name: String,
    },

    /// A callback parameter is not valid base58.
    #[error("Invalid base58 encoding in parameter: {param}")]
    InvalidEncoding {
        /// Name of the undecodable parameter.
        param: String,
    },

    /// The wallet's encryption key is a degenerate curve point.
    #[error("Invalid wallet encryption key")]
    InvalidPeerKey,

    /// The callback URL could not be parsed.
    #[error("Malformed callback URL: {0}")]
    MalformedUrl(String),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
