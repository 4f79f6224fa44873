//! Platform link boundary
//!
//! Outbound requests leave the process as deep-link URLs handed to the
//! host platform, and wallet answers come back as callback URLs the
//! platform routes to the app. Both directions are modeled here:
//! [`LinkOpener`] for the outbound hand-off and [`CallbackInbox`] for
//! the inbound stream.
//!
//! Opening a link is fire-and-forget. A successful [`LinkOpener::open_url`]
//! means the platform accepted the URL, not that the wallet acted on it.
//! Whether an answer ever arrives is up to the user and the wallet.

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

/// Error from the platform link opener
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The platform refused or failed to open the URL
    #[error("Failed to open link: {0}")]
    OpenFailed(String),
}

/// Opens deep-link URLs through the host platform
#[async_trait]
pub trait LinkOpener: Send + Sync {
    /// Hand a URL to the platform for opening
    async fn open_url(&self, url: &Url) -> Result<(), LinkError>;
}

/// Create a linked callback sender and inbox pair
pub fn callback_channel() -> (CallbackSender, CallbackInbox) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (CallbackSender { sender }, CallbackInbox { receiver })
}

/// Delivery handle the platform glue pushes callback URLs into
///
/// Clone freely; all clones feed the same inbox.
#[derive(Clone)]
pub struct CallbackSender {
    sender: mpsc::UnboundedSender<Url>,
}

impl CallbackSender {
    /// Deliver a callback URL to the inbox.
    ///
    /// Returns `false` if the inbox has been dropped.
    pub fn deliver(&self, url: Url) -> bool {
        self.sender.send(url).is_ok()
    }
}

/// Inbound callback URLs, consumed in arrival order
pub struct CallbackInbox {
    receiver: mpsc::UnboundedReceiver<Url>,
}

impl CallbackInbox {
    /// Receive the next callback URL.
    ///
    /// Returns `None` once every [`CallbackSender`] has been dropped.
    pub async fn recv(&mut self) -> Option<Url> {
        self.receiver.recv().await
    }
}

/// Link opener that forwards opened URLs into a channel.
///
/// Stands in for the OS when both ends of the link live in one
/// process, which is how the integration tests and the demo wire a
/// client to a wallet.
pub struct LoopbackLink {
    sender: mpsc::UnboundedSender<Url>,
}

impl LoopbackLink {
    /// Create a loopback opener and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Url>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl LinkOpener for LoopbackLink {
    async fn open_url(&self, url: &Url) -> Result<(), LinkError> {
        self.sender
            .send(url.clone())
            .map_err(|_| LinkError::OpenFailed("loopback receiver dropped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_forwards_opened_urls() {
        let (link, mut opened) = LoopbackLink::new();
        let url = Url::parse("courierwallet://v1/connect?cluster=devnet").unwrap();

        link.open_url(&url).await.unwrap();

        assert_eq!(opened.recv().await, Some(url));
    }

    #[tokio::test]
    async fn test_loopback_fails_once_receiver_dropped() {
        let (link, opened) = LoopbackLink::new();
        drop(opened);

        let url = Url::parse("courierwallet://v1/connect").unwrap();
        assert!(link.open_url(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_inbox_preserves_arrival_order() {
        let (sender, mut inbox) = callback_channel();

        let first = Url::parse("courierdapp://callbacks/onConnect?a=1").unwrap();
        let second = Url::parse("courierdapp://callbacks/onDisconnect?b=2").unwrap();
        assert!(sender.deliver(first.clone()));
        assert!(sender.deliver(second.clone()));

        assert_eq!(inbox.recv().await, Some(first));
        assert_eq!(inbox.recv().await, Some(second));
    }

    #[tokio::test]
    async fn test_deliver_reports_dropped_inbox() {
        let (sender, inbox) = callback_channel();
        drop(inbox);

        let url = Url::parse("courierdapp://callbacks/onConnect").unwrap();
        assert!(!sender.deliver(url));
    }

    #[tokio::test]
    async fn test_inbox_ends_when_senders_dropped() {
        let (sender, mut inbox) = callback_channel();
        drop(sender);

        assert_eq!(inbox.recv().await, None);
    }
}
