//! # courier-core
//!
//! High-level API for the courier deep-link wallet protocol.
//!
//! This is the main entry point for applications talking to a wallet
//! app over deep links.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use courier_core::{callback_channel, CourierClient, LinkConfig, SessionEvent};
//!
//! let (sender, inbox) = callback_channel();
//! let client = CourierClient::new(LinkConfig::default(), opener, inbox)?;
//!
//! // Ask the wallet for a session
//! client.connect().await?;
//!
//! // Platform glue pushes wallet redirects into `sender`; the answers
//! // come out here in delivery order
//! match client.next_event().await? {
//!     SessionEvent::Connected { address, .. } => println!("connected: {}", address),
//!     other => println!("{:?}", other),
//! }
//! ```
//!
//! ## Connection States
//!
//! The [`CourierClient`] owns a connection state machine:
//!
//! - **Disconnected**: no session and no pending attempt
//! - **Connecting**: a connect request is out, waiting for wallet approval
//! - **Connected**: an approved session is active
//!
//! ## Architecture
//!
//! - **SessionStateMachine**: owns key material, session data, and the
//!   correlation ids of outstanding requests
//! - **CourierClient**: builds deep-link requests and consumes wallet
//!   callbacks
//! - **LinkOpener / CallbackInbox**: the platform URL boundary
//! - **WalletStore / TransactionBuilder**: host-side collaborators the
//!   client never looks behind

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod link;
pub mod session;
pub mod wallet;

// Main client export
pub use client::CourierClient;

pub use config::{
    AppConfig, CallbackConfig, Cluster, ConfigError, LinkConfig, LinkConfigBuilder, WalletConfig,
};
pub use error::{CoreError, Result};
pub use link::{
    callback_channel, CallbackInbox, CallbackSender, LinkError, LinkOpener, LoopbackLink,
};
pub use session::{ConnectionStatus, Session, SessionEvent, SessionStateMachine};
pub use wallet::{
    StoredWallet, TransactionBuildError, TransactionBuilder, WalletStore, WalletStoreError,
};

// Re-export commonly used protocol types
pub use courier_protocol::{CallbackEvent, CorrelationId, Method, SessionToken, WalletAddress};
