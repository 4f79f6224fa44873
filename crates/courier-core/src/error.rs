//! Error types for courier-core

use thiserror::Error;

/// Top-level error type for session orchestration
#[derive(Debug, Error)]
pub enum CoreError {
    /// An operation that needs an active session was called without one.
    ///
    /// The request is refused locally. No deep link is opened and the
    /// connection state is left untouched.
    #[error("Not connected: no active wallet session")]
    NotConnected,

    /// A callback arrived for a request that is no longer outstanding.
    ///
    /// Covers answers to abandoned connection attempts, replays of
    /// already-consumed callbacks, and callbacks whose correlation id
    /// is missing or undecodable. The callback is discarded without
    /// decryption and the connection state is left untouched.
    #[error("Stale callback: no matching outstanding request")]
    StaleCallback,

    /// The callback channel closed with no remaining senders
    #[error("Callback channel closed")]
    ChannelClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Link opener error
    #[error("Link error: {0}")]
    Link(#[from] crate::link::LinkError),

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] courier_protocol::ProtocolError),

    /// Cryptographic error
    #[error("Crypto error: {0}")]
    Crypto(#[from] courier_crypto::CryptoError),
}

/// Result type alias for courier-core operations
pub type Result<T> = std::result::Result<T, CoreError>;
