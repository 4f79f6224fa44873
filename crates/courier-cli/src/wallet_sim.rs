//! In-process reference wallet
//!
//! Plays the wallet app's half of the protocol so the demo can run a
//! complete conversation without a real device: it consumes the deep
//! links a client opens, decrypts the payloads with the shared secret
//! it derives at connect time, and pushes the redirect URLs a wallet
//! would open back into the client's callback inbox.
//!
//! It also implements the [`WalletStore`] custody interface, standing
//! in for a host that keeps a signing key locally.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use courier_core::{CallbackSender, StoredWallet, WalletStore, WalletStoreError};
use courier_core::{TransactionBuildError, TransactionBuilder};
use courier_crypto::{Envelope, Nonce, PublicKey, SessionKeyPair, SharedSecret};
use courier_protocol::{
    open_payload, seal_payload, ConnectResponse, DisconnectRequest, SessionToken,
    SignAllTransactionsRequest, SignAllTransactionsResponse, SignAndSendTransactionRequest,
    SignAndSendTransactionResponse, SignMessageRequest, SignMessageResponse,
    SignTransactionRequest, SignTransactionResponse, WalletAddress,
};

/// Reference wallet: answers client deep links and holds a demo key
pub struct ReferenceWallet {
    inner: Arc<Mutex<WalletState>>,
}

struct WalletState {
    keypair: SessionKeyPair,
    wallet: Option<WalletAddress>,
    shared: Option<SharedSecret>,
    session_token: Option<String>,
    connects: u64,
}

impl ReferenceWallet {
    /// Create a wallet with no stored key yet
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(WalletState {
                keypair: SessionKeyPair::generate(),
                wallet: None,
                shared: None,
                session_token: None,
                connects: 0,
            })),
        }
    }

    /// Answer requests from `outbound` until the channel closes,
    /// delivering each redirect through `sender`.
    pub fn spawn(
        &self,
        mut outbound: UnboundedReceiver<Url>,
        sender: CallbackSender,
    ) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            while let Some(request) = outbound.recv().await {
                let answer = inner.lock().await.answer(&request);
                match answer {
                    Ok(redirect) => {
                        if !sender.deliver(redirect) {
                            break;
                        }
                    }
                    Err(error) => {
                        warn!(error = %error, "reference wallet could not answer request");
                    }
                }
            }
        })
    }
}

impl Default for ReferenceWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletStore for ReferenceWallet {
    async fn load(&self) -> Result<Option<StoredWallet>, WalletStoreError> {
        let state = self.inner.lock().await;
        Ok(state.wallet.clone().map(|address| StoredWallet { address }))
    }

    async fn create(&self) -> Result<StoredWallet, WalletStoreError> {
        let mut state = self.inner.lock().await;

        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let address = WalletAddress::parse(&bs58::encode(bytes).into_string())
            .map_err(|e| WalletStoreError::Storage(e.to_string()))?;

        state.wallet = Some(address.clone());
        Ok(StoredWallet { address })
    }

    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletStoreError> {
        let state = self.inner.lock().await;
        if state.wallet.is_none() {
            return Err(WalletStoreError::NotFound);
        }
        Ok(fake_signature(message).into_bytes())
    }
}

impl WalletState {
    fn answer(&mut self, request: &Url) -> Result<Url> {
        match method_of(request).as_str() {
            "connect" => self.answer_connect(request),
            "disconnect" => self.answer_disconnect(request),
            "signAndSendTransaction" => self.answer_sign_and_send(request),
            "signAllTransactions" => self.answer_sign_all(request),
            "signTransaction" => self.answer_sign_transaction(request),
            "signMessage" => self.answer_sign_message(request),
            other => Err(anyhow!("unsupported request method '{}'", other)),
        }
    }

    fn answer_connect(&mut self, request: &Url) -> Result<Url> {
        let address = self
            .wallet
            .clone()
            .context("no wallet has been created yet")?;

        let raw = bs58::decode(query(request, "dapp_encryption_public_key")?)
            .into_vec()
            .context("dapp key is not base58")?;
        let dapp_public = PublicKey::from_bytes(&raw).context("dapp key has the wrong length")?;
        let shared = self.keypair.diffie_hellman(&dapp_public);

        self.connects += 1;
        let token = format!("session-{}", self.connects);
        let response = ConnectResponse {
            public_key: address.to_string(),
            session: SessionToken::new(&token),
        };
        let envelope = seal_payload(&shared, &response)?;

        self.shared = Some(shared);
        self.session_token = Some(token);
        debug!(%address, "reference wallet approved a connection");

        let mut redirect = redirect_of(request)?;
        redirect
            .query_pairs_mut()
            .append_pair(
                "wallet_encryption_public_key",
                &bs58::encode(self.keypair.public().as_bytes()).into_string(),
            )
            .append_pair(
                "nonce",
                &bs58::encode(envelope.nonce.as_bytes()).into_string(),
            )
            .append_pair("data", &bs58::encode(&envelope.ciphertext).into_string());
        Ok(redirect)
    }

    fn answer_disconnect(&mut self, request: &Url) -> Result<Url> {
        let payload: DisconnectRequest = self.open_request(request)?;
        if !self.session_matches(&payload.session) {
            return reject(request, "4100", "Session token invalid");
        }

        self.shared = None;
        self.session_token = None;
        debug!("reference wallet closed the session");

        // Plain acknowledgement, nothing encrypted.
        redirect_of(request)
    }

    fn answer_sign_message(&self, request: &Url) -> Result<Url> {
        let payload: SignMessageRequest = self.open_request(request)?;
        if !self.session_matches(&payload.session) {
            return reject(request, "4100", "Session token invalid");
        }

        let message_bytes = bs58::decode(&payload.message)
            .into_vec()
            .context("message is not base58")?;
        let response = SignMessageResponse {
            signature: fake_signature(&message_bytes),
        };
        self.sealed_redirect(request, &response)
    }

    fn answer_sign_and_send(&self, request: &Url) -> Result<Url> {
        let payload: SignAndSendTransactionRequest = self.open_request(request)?;
        if !self.session_matches(&payload.session) {
            return reject(request, "4100", "Session token invalid");
        }

        let transaction = bs58::decode(&payload.transaction)
            .into_vec()
            .context("transaction is not base58")?;
        let response = SignAndSendTransactionResponse {
            signature: fake_signature(&transaction),
        };
        self.sealed_redirect(request, &response)
    }

    fn answer_sign_all(&self, request: &Url) -> Result<Url> {
        let payload: SignAllTransactionsRequest = self.open_request(request)?;
        if !self.session_matches(&payload.session) {
            return reject(request, "4100", "Session token invalid");
        }

        let transactions = payload
            .transactions
            .iter()
            .map(|transaction| format!("signed:{}", transaction))
            .collect();
        self.sealed_redirect(request, &SignAllTransactionsResponse { transactions })
    }

    fn answer_sign_transaction(&self, request: &Url) -> Result<Url> {
        let payload: SignTransactionRequest = self.open_request(request)?;
        if !self.session_matches(&payload.session) {
            return reject(request, "4100", "Session token invalid");
        }

        let response = SignTransactionResponse {
            transaction: format!("signed:{}", payload.transaction),
        };
        self.sealed_redirect(request, &response)
    }

    fn session_matches(&self, session: &SessionToken) -> bool {
        self.session_token.as_deref() == Some(session.as_str())
    }

    fn open_request<T: DeserializeOwned>(&self, request: &Url) -> Result<T> {
        let shared = self.shared.as_ref().context("no active session")?;

        let nonce = bs58::decode(query(request, "nonce")?)
            .into_vec()
            .context("nonce is not base58")?;
        let ciphertext = bs58::decode(query(request, "payload")?)
            .into_vec()
            .context("payload is not base58")?;
        let envelope = Envelope {
            nonce: Nonce::from_bytes(&nonce)?,
            ciphertext,
        };

        Ok(open_payload(shared, &envelope)?)
    }

    fn sealed_redirect<T: serde::Serialize>(&self, request: &Url, response: &T) -> Result<Url> {
        let shared = self.shared.as_ref().context("no active session")?;
        let envelope = seal_payload(shared, response)?;

        let mut redirect = redirect_of(request)?;
        redirect
            .query_pairs_mut()
            .append_pair(
                "nonce",
                &bs58::encode(envelope.nonce.as_bytes()).into_string(),
            )
            .append_pair("data", &bs58::encode(&envelope.ciphertext).into_string());
        Ok(redirect)
    }
}

/// Builds placeholder transfer transactions for the demo
pub struct DemoTransferBuilder;

impl TransactionBuilder for DemoTransferBuilder {
    fn build_transfer(
        &self,
        from: &WalletAddress,
        to: &WalletAddress,
    ) -> Result<Vec<u8>, TransactionBuildError> {
        Ok(format!("transfer:{}->{}", from, to).into_bytes())
    }
}

fn fake_signature(message: &[u8]) -> String {
    format!("refsig({})", bs58::encode(message).into_string())
}

fn method_of(request: &Url) -> String {
    request
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .to_string()
}

fn query(request: &Url, name: &str) -> Result<String> {
    request
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| anyhow!("request is missing the '{}' parameter", name))
}

fn redirect_of(request: &Url) -> Result<Url> {
    Url::parse(&query(request, "redirect_link")?).context("redirect_link does not parse")
}

fn reject(request: &Url, code: &str, message: &str) -> Result<Url> {
    let mut redirect = redirect_of(request)?;
    redirect
        .query_pairs_mut()
        .append_pair("errorCode", code)
        .append_pair("errorMessage", message);
    Ok(redirect)
}
