//! Property-based tests for the wire layer.
//!
//! These tests use proptest to verify protocol properties hold for
//! arbitrary inputs. They focus on:
//!
//! - Roundtrip properties (seal/open of typed payloads)
//! - Robustness properties (parsers never panic on junk)
//! - Classification properties (only exact tokens match)

use proptest::prelude::*;
use url::Url;

use courier_crypto::SessionKeyPair;

use crate::method::Method;
use crate::payload::{open_payload, seal_payload, SessionToken, SignMessageRequest};
use crate::request::CorrelationId;
use crate::router::{classify, CallbackEvent};

proptest! {
    /// Typed payloads roundtrip through seal/open for arbitrary
    /// token and message content.
    #[test]
    fn payload_seal_open_roundtrip(session in ".{0,64}", message: Vec<u8>) {
        let dapp = SessionKeyPair::generate();
        let wallet = SessionKeyPair::generate();
        let dapp_shared = dapp.diffie_hellman(wallet.public());
        let wallet_shared = wallet.diffie_hellman(dapp.public());

        let request = SignMessageRequest {
            session: SessionToken::new(session),
            message: bs58::encode(&message).into_string(),
        };

        let envelope = seal_payload(&dapp_shared, &request).unwrap();
        let opened: SignMessageRequest = open_payload(&wallet_shared, &envelope).unwrap();
        prop_assert_eq!(opened, request);
    }

    /// Opening under an unrelated secret always fails.
    #[test]
    fn payload_wrong_secret_fails(message in prop::collection::vec(any::<u8>(), 1..200)) {
        let dapp = SessionKeyPair::generate();
        let wallet = SessionKeyPair::generate();
        let stranger = SessionKeyPair::generate();
        let shared = dapp.diffie_hellman(wallet.public());
        let wrong = stranger.diffie_hellman(wallet.public());

        let request = SignMessageRequest {
            session: SessionToken::new("tok-123"),
            message: bs58::encode(&message).into_string(),
        };

        let envelope = seal_payload(&shared, &request).unwrap();
        let result: crate::Result<SignMessageRequest> = open_payload(&wrong, &envelope);
        prop_assert!(result.is_err());
    }

    /// Parsing arbitrary strings as callback URLs never panics.
    #[test]
    fn callback_parse_never_panics(raw: String) {
        let _ = CallbackEvent::parse(&raw);
    }

    /// Classification of arbitrary URLs never panics, and only the six
    /// known tokens classify successfully.
    #[test]
    fn classify_only_known_tokens(token in "[a-zA-Z0-9]{0,32}") {
        let url = Url::parse(&format!("courierdapp://callbacks/{token}")).unwrap();
        let event = CallbackEvent::from_url(&url);

        let expected = Method::ALL
            .iter()
            .any(|method| method.callback_token() == token);
        prop_assert_eq!(classify(&event).is_ok(), expected);
    }

    /// Correlation ids roundtrip through their base58 form.
    #[test]
    fn correlation_roundtrip(_seed in any::<u64>()) {
        let correlation = CorrelationId::generate();
        let restored = CorrelationId::from_base58(&correlation.to_base58()).unwrap();
        prop_assert_eq!(correlation, restored);
    }

    /// Arbitrary query parameters never confuse the error short
    /// circuit: a callback without errorCode is never a remote error.
    #[test]
    fn no_error_code_no_remote_error(name in "[a-zA-Z_]{1,20}", value in ".{0,40}") {
        prop_assume!(name != "errorCode");
        let url = Url::parse_with_params(
            "courierdapp://callbacks/onSignMessage",
            &[(name.as_str(), value.as_str())],
        )
        .unwrap();
        let event = CallbackEvent::from_url(&url);

        let is_remote_error = matches!(
            classify(&event),
            Err(crate::ProtocolError::Remote { .. })
        );
        prop_assert!(!is_remote_error);
    }
}
