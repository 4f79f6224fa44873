//! Main courier client implementation.
//!
//! The [`CourierClient`] is the primary entry point for applications
//! driving a wallet conversation over deep links. Requests leave the
//! process through a [`LinkOpener`] and wallet answers come back
//! through the [`CallbackInbox`] handed over at construction, so the
//! protocol handling stays independent of how the host platform
//! actually moves URLs around.
//!
//! # Client Lifecycle
//!
//! ```text
//!     connect()
//!         │
//!         ▼
//!    ┌────────────┐   onConnect callback   ┌───────────┐
//!    │ Connecting │ ─────────────────────► │ Connected │◄──┐
//!    └────────────┘                        └─────┬─────┘   │
//!         ▲                                      │         │ sign / send
//!         │                                      │         │ requests
//!     connect()                                  └─────────┘
//!         │                                      │
//!    ┌────┴─────────┐   onDisconnect ack,        │
//!    │ Disconnected │◄──wallet error,────────────┘
//!    └──────────────┘   authentication failure
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use courier_core::{callback_channel, CourierClient, LinkConfig, LoopbackLink, SessionEvent};
//!
//! let (link, _outbound) = LoopbackLink::new();
//! let (sender, inbox) = callback_channel();
//! let client = CourierClient::new(LinkConfig::default(), Arc::new(link), inbox)?;
//!
//! client.connect().await?;
//! // platform glue feeds wallet redirects into `sender`
//! match client.next_event().await? {
//!     SessionEvent::Connected { address, .. } => println!("connected to {}", address),
//!     other => println!("unexpected event: {:?}", other),
//! }
//! ```
//!
//! # Security Notes
//!
//! - The secret half of the session keypair never leaves the client;
//!   only its public half is placed in URLs.
//! - Callbacks are authenticated by AEAD decryption and gated on their
//!   correlation id before any state changes.
//! - Stale and unknown callbacks are logged and dropped without ever
//!   reaching the decryption path.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use courier_protocol::{
    connect_request, encrypted_request, redirect_link, CallbackEvent, DisconnectRequest, Method,
    ProtocolError, SessionToken, SignAllTransactionsRequest, SignAndSendTransactionRequest,
    SignMessageRequest, SignTransactionRequest, WalletAddress,
};

use crate::config::LinkConfig;
use crate::error::{CoreError, Result};
use crate::link::{CallbackInbox, LinkOpener};
use crate::session::{ConnectionStatus, SessionEvent, SessionStateMachine};

// ============================================================================
// Courier Client
// ============================================================================

/// High-level deep-link wallet client
pub struct CourierClient {
    /// Client configuration
    config: LinkConfig,
    /// Parsed wallet base, joined with method path segments
    wallet_base: Url,
    /// Parsed callback base, joined with callback tokens
    redirect_base: Url,
    /// Platform hand-off for outbound deep links
    opener: Arc<dyn LinkOpener>,
    /// Owned connection state
    machine: Mutex<SessionStateMachine>,
    /// Inbound wallet redirects
    inbox: Mutex<CallbackInbox>,
}

impl CourierClient {
    // ========================================================================
    // Lifecycle Methods
    // ========================================================================

    /// Create a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the base URLs cannot serve
    /// as join bases.
    pub fn new(
        config: LinkConfig,
        opener: Arc<dyn LinkOpener>,
        inbox: CallbackInbox,
    ) -> Result<Self> {
        config.validate()?;
        let wallet_base = config.wallet_base()?;
        let redirect_base = config.redirect_base()?;

        info!(
            wallet = %wallet_base,
            cluster = %config.app.cluster,
            "creating courier client"
        );

        Ok(Self {
            config,
            wallet_base,
            redirect_base,
            opener,
            machine: Mutex::new(SessionStateMachine::new()),
            inbox: Mutex::new(inbox),
        })
    }

    /// The configuration this client was built from
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Current connection status
    pub async fn status(&self) -> ConnectionStatus {
        self.machine.lock().await.status()
    }

    /// Whether an approved session is active
    pub async fn is_connected(&self) -> bool {
        self.status().await.is_connected()
    }

    /// Token of the active session, if any
    pub async fn session_token(&self) -> Option<SessionToken> {
        self.machine
            .lock()
            .await
            .session()
            .map(|session| session.token().clone())
    }

    /// Wallet address of the active session, if any
    pub async fn wallet_address(&self) -> Option<WalletAddress> {
        self.machine
            .lock()
            .await
            .session()
            .map(|session| session.address().clone())
    }

    // ========================================================================
    // Request Methods
    // ========================================================================

    /// Ask the wallet to establish a session.
    ///
    /// Opens a connect deep link carrying a fresh ephemeral public key
    /// and returns as soon as the platform accepts the URL. The
    /// wallet's answer arrives later through [`next_event`]. Calling
    /// this again before an answer abandons the previous attempt.
    ///
    /// [`next_event`]: CourierClient::next_event
    pub async fn connect(&self) -> Result<()> {
        let url = {
            let mut machine = self.machine.lock().await;
            let (public, correlation) = machine.begin_connect();
            let redirect = redirect_link(&self.redirect_base, Method::Connect, &correlation)?;
            let request = connect_request(
                &public,
                self.config.app.cluster.as_str(),
                &self.config.app.url,
                &redirect,
            );
            request.to_url(&self.wallet_base)?
        };

        debug!(method = %Method::Connect, "opening deep link");
        self.opener.open_url(&url).await?;
        Ok(())
    }

    /// Ask the wallet to end the session.
    ///
    /// The local session stays in place until the wallet's
    /// acknowledgement comes back as [`SessionEvent::Disconnected`].
    pub async fn disconnect(&self) -> Result<()> {
        self.send_session_request(Method::Disconnect, |token| DisconnectRequest {
            session: token.clone(),
        })
        .await
    }

    /// Ask the wallet to sign and submit a serialized transaction
    pub async fn sign_and_send_transaction(&self, transaction: &[u8]) -> Result<()> {
        let encoded = bs58::encode(transaction).into_string();
        self.send_session_request(Method::SignAndSendTransaction, |token| {
            SignAndSendTransactionRequest {
                session: token.clone(),
                transaction: encoded,
            }
        })
        .await
    }

    /// Ask the wallet to sign a batch of serialized transactions
    pub async fn sign_all_transactions(&self, transactions: &[Vec<u8>]) -> Result<()> {
        let encoded = transactions
            .iter()
            .map(|transaction| bs58::encode(transaction).into_string())
            .collect();
        self.send_session_request(Method::SignAllTransactions, |token| {
            SignAllTransactionsRequest {
                session: token.clone(),
                transactions: encoded,
            }
        })
        .await
    }

    /// Ask the wallet to sign a serialized transaction without
    /// submitting it
    pub async fn sign_transaction(&self, transaction: &[u8]) -> Result<()> {
        let encoded = bs58::encode(transaction).into_string();
        self.send_session_request(Method::SignTransaction, |token| SignTransactionRequest {
            session: token.clone(),
            transaction: encoded,
        })
        .await
    }

    /// Ask the wallet to sign a UTF-8 message
    pub async fn sign_message(&self, message: &str) -> Result<()> {
        let encoded = bs58::encode(message.as_bytes()).into_string();
        self.send_session_request(Method::SignMessage, |token| SignMessageRequest {
            session: token.clone(),
            message: encoded,
        })
        .await
    }

    // ========================================================================
    // Callback Methods
    // ========================================================================

    /// Wait for the next wallet answer and apply it.
    ///
    /// Callbacks are processed in delivery order. Stale callbacks and
    /// callbacks for unknown methods are logged and dropped here, so
    /// the caller only ever sees answers to live requests. Wallet
    /// errors and authentication failures are surfaced after the
    /// session state has been torn down.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ChannelClosed` once every callback sender
    /// has been dropped.
    pub async fn next_event(&self) -> Result<SessionEvent> {
        loop {
            let url = {
                let mut inbox = self.inbox.lock().await;
                inbox.recv().await.ok_or(CoreError::ChannelClosed)?
            };

            let event = CallbackEvent::from_url(&url);
            let outcome = self.machine.lock().await.handle_callback(&event);
            match outcome {
                Ok(session_event) => return Ok(session_event),
                Err(CoreError::StaleCallback) => {
                    debug!(token = %event.token, "dropping stale callback");
                }
                Err(CoreError::Protocol(ProtocolError::UnknownMethod { token })) => {
                    warn!(token = %token, "dropping callback for unknown method");
                }
                Err(error) => return Err(error),
            }
        }
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Build, seal, and open a deep link for a session method.
    async fn send_session_request<T, F>(&self, method: Method, build: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce(&SessionToken) -> T,
    {
        let url = {
            let mut machine = self.machine.lock().await;
            let correlation = machine.begin_request(method)?;
            let session = machine.session().ok_or(CoreError::NotConnected)?;

            let payload = build(session.token());
            let redirect = redirect_link(&self.redirect_base, method, &correlation)?;
            let request = encrypted_request(
                method,
                session.dapp_public(),
                session.shared_secret(),
                &payload,
                &redirect,
            )?;
            request.to_url(&self.wallet_base)?
        };

        debug!(method = %method, "opening deep link");
        self.opener.open_url(&url).await?;
        Ok(())
    }
}

impl std::fmt::Debug for CourierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourierClient")
            .field("wallet_base", &self.wallet_base.as_str())
            .field("redirect_base", &self.redirect_base.as_str())
            .finish_non_exhaustive()
    }
}
