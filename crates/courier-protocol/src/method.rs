//! The closed table of wallet methods.
//!
//! The protocol supports a fixed set of operations. Outbound requests
//! use the request path segment; the wallet answers on a per-method
//! callback URL named by the callback token. Classification is an
//! exact match against the token table, so adding a method is a
//! compile-time-checked change here rather than a new pattern in a
//! dispatcher.

use serde::{Deserialize, Serialize};

/// A wallet operation the dapp can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Establish a session and learn the wallet's address.
    Connect,
    /// Tear down the current session.
    Disconnect,
    /// Sign a transaction and submit it to the network.
    SignAndSendTransaction,
    /// Sign a batch of transactions without submitting them.
    SignAllTransactions,
    /// Sign a single transaction without submitting it.
    SignTransaction,
    /// Sign an arbitrary UTF-8 message.
    SignMessage,
}

impl Method {
    /// Every method, in wire order.
    pub const ALL: [Method; 6] = [
        Method::Connect,
        Method::Disconnect,
        Method::SignAndSendTransaction,
        Method::SignAllTransactions,
        Method::SignTransaction,
        Method::SignMessage,
    ];

    /// The path segment used when building the outbound deep link.
    #[must_use]
    pub fn path_segment(&self) -> &'static str {
        match self {
            Method::Connect => "connect",
            Method::Disconnect => "disconnect",
            Method::SignAndSendTransaction => "signAndSendTransaction",
            Method::SignAllTransactions => "signAllTransactions",
            Method::SignTransaction => "signTransaction",
            Method::SignMessage => "signMessage",
        }
    }

    /// The token naming this method's callback URL.
    #[must_use]
    pub fn callback_token(&self) -> &'static str {
        match self {
            Method::Connect => "onConnect",
            Method::Disconnect => "onDisconnect",
            Method::SignAndSendTransaction => "onSignAndSendTransaction",
            Method::SignAllTransactions => "onSignAllTransactions",
            Method::SignTransaction => "onSignTransaction",
            Method::SignMessage => "onSignMessage",
        }
    }

    /// Look up a method by its callback token. Exact match only.
    #[must_use]
    pub fn from_callback_token(token: &str) -> Option<Method> {
        Method::ALL
            .iter()
            .copied()
            .find(|method| method.callback_token() == token)
    }

    /// Whether this method's payload is sealed under an established
    /// session secret. Only `connect` runs before a secret exists.
    #[must_use]
    pub fn requires_session(&self) -> bool {
        !matches!(self, Method::Connect)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_tokens_roundtrip() {
        for method in Method::ALL {
            assert_eq!(
                Method::from_callback_token(method.callback_token()),
                Some(method)
            );
        }
    }

    #[test]
    fn test_unknown_tokens_rejected() {
        assert_eq!(Method::from_callback_token("onTeleport"), None);
        assert_eq!(Method::from_callback_token(""), None);
        // Substrings and prefixes of real tokens must not match
        assert_eq!(Method::from_callback_token("onConnectExtra"), None);
        assert_eq!(Method::from_callback_token("Connect"), None);
        assert_eq!(Method::from_callback_token("onSign"), None);
    }

    #[test]
    fn test_classification_is_case_sensitive() {
        assert_eq!(Method::from_callback_token("onconnect"), None);
        assert_eq!(Method::from_callback_token("ONCONNECT"), None);
    }

    #[test]
    fn test_only_connect_runs_without_session() {
        for method in Method::ALL {
            assert_eq!(method.requires_session(), method != Method::Connect);
        }
    }

    #[test]
    fn test_display_matches_path() {
        assert_eq!(Method::SignAndSendTransaction.to_string(), "signAndSendTransaction");
        assert_eq!(Method::Connect.to_string(), "connect");
    }
}
