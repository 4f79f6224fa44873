//! Host-side wallet collaborators
//!
//! The client never interprets keys, balances, or transaction
//! contents; those belong to the host application. These traits are
//! the seams the host plugs its own implementations into: durable key
//! custody behind [`WalletStore`], transaction assembly behind
//! [`TransactionBuilder`].

use async_trait::async_trait;
use courier_protocol::WalletAddress;

/// Error from a wallet store implementation
#[derive(Debug, thiserror::Error)]
pub enum WalletStoreError {
    /// No wallet has been created yet
    #[error("No stored wallet")]
    NotFound,

    /// Underlying storage failed
    #[error("Wallet storage error: {0}")]
    Storage(String),

    /// Signing failed
    #[error("Wallet signing error: {0}")]
    Signing(String),
}

/// A wallet held by the host application
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredWallet {
    /// Address of the stored wallet
    pub address: WalletAddress,
}

/// Durable custody of a locally held wallet key
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Load the stored wallet, if one exists
    async fn load(&self) -> Result<Option<StoredWallet>, WalletStoreError>;

    /// Create and persist a new wallet
    async fn create(&self) -> Result<StoredWallet, WalletStoreError>;

    /// Sign a message with the stored wallet's key
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, WalletStoreError>;
}

/// Error from a transaction builder implementation
#[derive(Debug, thiserror::Error)]
pub enum TransactionBuildError {
    /// The transaction could not be assembled
    #[error("Failed to build transaction: {0}")]
    Build(String),
}

/// Assembles serialized transactions for signing flows.
///
/// The client treats the returned bytes as opaque; they are base58
/// encoded into the deep link without inspection.
pub trait TransactionBuilder: Send + Sync {
    /// Build a transfer from `from` to `to`, returning the serialized
    /// transaction bytes
    fn build_transfer(
        &self,
        from: &WalletAddress,
        to: &WalletAddress,
    ) -> Result<Vec<u8>, TransactionBuildError>;
}
