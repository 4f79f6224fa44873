//! Connection lifecycle state machine
//!
//! Owns everything a wallet conversation accumulates: the ephemeral
//! keypair of a pending connection attempt, the shared secret and
//! session token of an established session, and the correlation ids of
//! requests still waiting for an answer.
//!
//! ```text
//!                    begin_connect()
//!   Disconnected ---------------------> Connecting
//!        ^                                  |
//!        |  error callback,                 |  connect callback
//!        |  authentication failure,         v
//!        |  disconnect acknowledgement
//!        +----------------------------- Connected <---+
//!                                           |          |
//!                                           +----------+
//!                                        sign / send requests
//! ```
//!
//! Every callback must carry the correlation id of an outstanding
//! request for its method. Answers to abandoned attempts, replays, and
//! callbacks whose id is missing or garbled are rejected as stale
//! before any decryption is attempted, so they can never disturb a
//! live session.
//!
//! Each machine is an owned value. Two machines in one process are
//! fully independent; nothing here touches shared state.

use std::collections::HashMap;

use tracing::{info, warn};

use courier_crypto::{PublicKey, SessionKeyPair, SharedSecret};
use courier_protocol::{
    classify, open_callback, CallbackEvent, CorrelationId, Method, ProtocolError, RouteKeys,
    SessionToken, WalletAddress, WalletEvent,
};

use crate::error::{CoreError, Result};

// ==================== Status ====================

/// Observable connection state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No session and no pending attempt
    Disconnected,
    /// A connect request is out, waiting for wallet approval
    Connecting,
    /// An approved session is active
    Connected,
}

impl ConnectionStatus {
    /// Whether an approved session is active
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    /// Human-readable state description
    pub fn description(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "no wallet session",
            ConnectionStatus::Connecting => "waiting for wallet approval",
            ConnectionStatus::Connected => "wallet session active",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ==================== Session data ====================

/// Material accumulated by an approved session
#[derive(Debug)]
pub struct Session {
    shared_secret: SharedSecret,
    token: SessionToken,
    address: WalletAddress,
    dapp_public: PublicKey,
}

impl Session {
    /// Shared secret requests are sealed under
    pub fn shared_secret(&self) -> &SharedSecret {
        &self.shared_secret
    }

    /// Token the wallet issued for this session
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Wallet address approved for this session
    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    /// Our public key, as the wallet knows it
    pub fn dapp_public(&self) -> &PublicKey {
        &self.dapp_public
    }
}

#[derive(Debug)]
struct ConnectAttempt {
    keypair: SessionKeyPair,
}

#[derive(Debug)]
enum ConnectionState {
    Disconnected,
    Connecting(ConnectAttempt),
    Connected(Session),
}

// ==================== Events ====================

/// Outcome of a successfully routed wallet callback
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The wallet approved the connection
    Connected {
        /// Token issued for the new session
        session: SessionToken,
        /// Approved wallet address
        address: WalletAddress,
    },
    /// The wallet acknowledged the disconnect
    Disconnected,
    /// The wallet signed and submitted a transaction
    TransactionSent {
        /// Transaction signature
        signature: String,
    },
    /// The wallet signed a batch of transactions
    TransactionsSigned {
        /// Signed transactions, encoded as sent by the wallet
        transactions: Vec<String>,
    },
    /// The wallet signed a single transaction
    TransactionSigned {
        /// Signed transaction, encoded as sent by the wallet
        transaction: String,
    },
    /// The wallet signed a message
    MessageSigned {
        /// Message signature
        signature: String,
    },
}

// ==================== State machine ====================

/// Owned connection state machine
#[derive(Debug)]
pub struct SessionStateMachine {
    state: ConnectionState,
    outstanding: HashMap<Method, CorrelationId>,
}

impl SessionStateMachine {
    /// Create a machine in the disconnected state
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            outstanding: HashMap::new(),
        }
    }

    /// Current observable status
    pub fn status(&self) -> ConnectionStatus {
        match self.state {
            ConnectionState::Disconnected => ConnectionStatus::Disconnected,
            ConnectionState::Connecting(_) => ConnectionStatus::Connecting,
            ConnectionState::Connected(_) => ConnectionStatus::Connected,
        }
    }

    /// The active session, if one is established
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            ConnectionState::Connected(session) => Some(session),
            _ => None,
        }
    }

    /// Start a connection attempt.
    ///
    /// Generates a fresh ephemeral keypair and correlation id.
    /// Any previous attempt or session is abandoned: its key material
    /// is dropped and its outstanding requests will be rejected as
    /// stale if the wallet ever answers them.
    pub fn begin_connect(&mut self) -> (PublicKey, CorrelationId) {
        let keypair = SessionKeyPair::generate();
        let public = keypair.public().clone();
        let correlation = CorrelationId::generate();

        self.outstanding.clear();
        self.outstanding.insert(Method::Connect, correlation.clone());
        self.state = ConnectionState::Connecting(ConnectAttempt { keypair });
        info!(status = %self.status(), "starting connection attempt");

        (public, correlation)
    }

    /// Register an outgoing request for a session method.
    ///
    /// Returns the correlation id the request must carry on its
    /// redirect link. A second request for the same method replaces
    /// the first; only the newest answer per method is accepted.
    /// Connect attempts go through [`begin_connect`] instead.
    ///
    /// [`begin_connect`]: SessionStateMachine::begin_connect
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotConnected` when no session is active.
    pub fn begin_request(&mut self, method: Method) -> Result<CorrelationId> {
        if !self.status().is_connected() {
            return Err(CoreError::NotConnected);
        }

        let correlation = CorrelationId::generate();
        self.outstanding.insert(method, correlation.clone());
        Ok(correlation)
    }

    /// Route an inbound callback and apply its state transition.
    ///
    /// The correlation gate runs before any decryption: a callback
    /// whose id is missing or does not match the outstanding request
    /// for its method is rejected as [`CoreError::StaleCallback`] and
    /// leaves the state untouched. That holds for wallet error
    /// callbacks too, so an answer to an abandoned attempt can never
    /// tear down the session that superseded it.
    ///
    /// # Errors
    ///
    /// Surfaces protocol errors from classification and decryption.
    /// `ProtocolError::Remote` and `ProtocolError::AuthenticationFailed`
    /// additionally reset the machine to disconnected.
    pub fn handle_callback(&mut self, event: &CallbackEvent) -> Result<SessionEvent> {
        // An undecodable id cannot match any outstanding request, so it
        // falls under the same stale rejection as a missing one.
        let Ok(correlation) = event.correlation() else {
            return Err(CoreError::StaleCallback);
        };

        match classify(event) {
            Ok(method) => self.handle_routed(method, correlation.as_ref(), event),
            Err(ProtocolError::Remote { code, message }) => {
                self.handle_remote_error(correlation.as_ref(), event, code, message)
            }
            Err(error) => Err(error.into()),
        }
    }

    // ==================== Transitions ====================

    fn handle_routed(
        &mut self,
        method: Method,
        correlation: Option<&CorrelationId>,
        event: &CallbackEvent,
    ) -> Result<SessionEvent> {
        if !self.is_outstanding(method, correlation) {
            return Err(CoreError::StaleCallback);
        }

        // The attempt key is snapshotted before routing; a connect
        // event consumes it for the session record.
        let attempt_public = match &self.state {
            ConnectionState::Connecting(attempt) => Some(attempt.keypair.public().clone()),
            _ => None,
        };

        let routed = {
            let keys = self.route_keys();
            open_callback(method, event, keys)
        };
        let routed = match routed {
            Ok(routed) => routed,
            Err(error) => {
                if matches!(error, ProtocolError::AuthenticationFailed) {
                    warn!(method = %method, "callback failed authentication, clearing session state");
                    self.reset();
                }
                return Err(error.into());
            }
        };

        self.outstanding.remove(&method);

        let session_event = match routed {
            WalletEvent::Connected {
                shared_secret,
                session,
                address,
            } => {
                let dapp_public = attempt_public.ok_or(ProtocolError::NoActiveSession)?;
                info!(address = %address, "wallet session established");
                let event = SessionEvent::Connected {
                    session: session.clone(),
                    address: address.clone(),
                };
                self.state = ConnectionState::Connected(Session {
                    shared_secret,
                    token: session,
                    address,
                    dapp_public,
                });
                event
            }
            WalletEvent::Disconnected => {
                info!("wallet acknowledged disconnect");
                self.reset();
                SessionEvent::Disconnected
            }
            WalletEvent::TransactionSent { signature } => {
                SessionEvent::TransactionSent { signature }
            }
            WalletEvent::TransactionsSigned { transactions } => {
                SessionEvent::TransactionsSigned { transactions }
            }
            WalletEvent::TransactionSigned { transaction } => {
                SessionEvent::TransactionSigned { transaction }
            }
            WalletEvent::MessageSigned { signature } => SessionEvent::MessageSigned { signature },
        };

        Ok(session_event)
    }

    fn handle_remote_error(
        &mut self,
        correlation: Option<&CorrelationId>,
        event: &CallbackEvent,
        code: String,
        message: Option<String>,
    ) -> Result<SessionEvent> {
        // An error callback still names its method through the
        // callback token, so the correlation gate applies to it the
        // same way before any teardown.
        let Some(method) = Method::from_callback_token(&event.token) else {
            return Err(CoreError::StaleCallback);
        };
        if !self.is_outstanding(method, correlation) {
            return Err(CoreError::StaleCallback);
        }

        self.outstanding.remove(&method);
        warn!(method = %method, code = %code, "wallet reported an error, clearing session state");
        self.reset();

        Err(CoreError::Protocol(ProtocolError::Remote { code, message }))
    }

    fn is_outstanding(&self, method: Method, correlation: Option<&CorrelationId>) -> bool {
        match (self.outstanding.get(&method), correlation) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => false,
        }
    }

    fn route_keys(&self) -> RouteKeys<'_> {
        match &self.state {
            ConnectionState::Disconnected => RouteKeys::None,
            ConnectionState::Connecting(attempt) => RouteKeys::Connecting {
                keypair: &attempt.keypair,
            },
            ConnectionState::Connected(session) => RouteKeys::Connected {
                shared: &session.shared_secret,
            },
        }
    }

    /// Drop all session material and outstanding requests. Abandoned
    /// secrets are zeroized on drop.
    fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.outstanding.clear();
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
