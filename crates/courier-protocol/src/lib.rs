//! # courier-protocol
//!
//! Wire protocol for courier deep-link wallet sessions.
//!
//! This crate provides:
//! - **Method**: the closed table of wallet operations and their
//!   callback tokens
//! - **RequestDescriptor**: outbound deep-link construction with the
//!   cleartext/encrypted parameter split
//! - **Payload sealing**: typed JSON payloads sealed into authenticated
//!   envelopes under the session's shared secret
//! - **Callback routing**: inbound URL classification and decryption
//!
//! ## Wire Design
//!
//! Requests and responses travel as URLs. Byte-valued parameters are
//! base58 text; encrypted payloads are JSON, sealed with
//! XChaCha20-Poly1305 under a key derived from the session's X25519
//! shared secret. Error callbacks carry cleartext `errorCode` /
//! `errorMessage` parameters and short-circuit all decryption.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod method;
pub mod payload;
pub mod request;
pub mod router;

#[cfg(test)]
mod proptests;

pub use error::{ProtocolError, Result};
pub use method::Method;
pub use payload::{
    open_payload, payload_key, seal_payload, ConnectResponse, DisconnectRequest,
    SessionToken, SignAllTransactionsRequest, SignAllTransactionsResponse,
    SignAndSendTransactionRequest, SignAndSendTransactionResponse, SignMessageRequest,
    SignMessageResponse, SignTransactionRequest, SignTransactionResponse, WalletAddress,
};
pub use request::{connect_request, encrypted_request, redirect_link, CorrelationId, RequestDescriptor};
pub use router::{classify, open_callback, CallbackEvent, RouteKeys, WalletEvent};
