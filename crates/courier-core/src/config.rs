//! Client configuration
//!
//! Configuration is grouped by concern: the wallet endpoint the client
//! opens deep links against, the identity the app presents to the
//! wallet, and the callback surface the wallet redirects back to.
//!
//! Base URLs are kept as strings so they can come straight from CLI
//! arguments or serialized config files. [`LinkConfig::validate`]
//! checks that they parse and can serve as join bases before any
//! request is built from them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

/// Target network cluster, sent with every connect request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    /// Main production network
    #[default]
    MainnetBeta,
    /// Development network
    Devnet,
    /// Test network
    Testnet,
}

impl Cluster {
    /// The name the wallet expects in the `cluster` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
        }
    }
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Cluster {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet-beta" => Ok(Cluster::MainnetBeta),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            other => Err(ConfigError::InvalidValue {
                field: "cluster".to_string(),
                reason: format!("unknown cluster '{}'", other),
            }),
        }
    }
}

/// Wallet endpoint configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Base URL the wallet serves the protocol under. Either a custom
    /// scheme base (`courierwallet://v1/`) or a universal-link base
    /// (`https://wallet.example/ul/v1/`). Must end with `/` so method
    /// names join as path segments.
    pub base_url: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            base_url: "courierwallet://v1/".to_string(),
        }
    }
}

/// App identity configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// URL the wallet fetches app metadata from, shown to the user
    /// during connection approval
    pub url: String,

    /// Cluster requested at connect time
    pub cluster: Cluster,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: "https://app.courier-link.dev".to_string(),
            cluster: Cluster::default(),
        }
    }
}

/// Callback surface configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Base URL the app receives wallet redirects under. The callback
    /// token for each method is joined onto this base, so it must end
    /// with `/`.
    pub redirect_base: String,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            redirect_base: "courierdapp://callbacks/".to_string(),
        }
    }
}

/// Top-level client configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Wallet endpoint settings
    pub wallet: WalletConfig,

    /// App identity settings
    pub app: AppConfig,

    /// Callback surface settings
    pub callback: CallbackConfig,
}

impl LinkConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder
    pub fn builder() -> LinkConfigBuilder {
        LinkConfigBuilder::new()
    }

    /// Parse the wallet base URL
    pub fn wallet_base(&self) -> Result<Url, ConfigError> {
        parse_base(&self.wallet.base_url, "wallet.base_url")
    }

    /// Parse the callback redirect base URL
    pub fn redirect_base(&self) -> Result<Url, ConfigError> {
        parse_base(&self.callback.redirect_base, "callback.redirect_base")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wallet_base()?;
        self.redirect_base()?;

        if self.app.url.is_empty() {
            return Err(ConfigError::Missing("app.url".to_string()));
        }
        Url::parse(&self.app.url).map_err(|e| ConfigError::InvalidValue {
            field: "app.url".to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

/// Parse a join base: must be an absolute URL, usable as a base, with
/// a trailing slash so joins append instead of replacing the last
/// path segment.
fn parse_base(raw: &str, field: &str) -> Result<Url, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::Missing(field.to_string()));
    }

    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "URL cannot serve as a join base".to_string(),
        });
    }

    if !url.path().ends_with('/') {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "base URL must end with '/'".to_string(),
        });
    }

    Ok(url)
}

/// Builder for [`LinkConfig`]
#[derive(Clone, Debug, Default)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Wallet Configuration =====

    /// Set the wallet base URL (custom scheme or universal link)
    pub fn with_wallet_base(mut self, base_url: impl Into<String>) -> Self {
        self.config.wallet.base_url = base_url.into();
        self
    }

    // ===== App Configuration =====

    /// Set the app metadata URL presented to the wallet
    pub fn with_app_url(mut self, url: impl Into<String>) -> Self {
        self.config.app.url = url.into();
        self
    }

    /// Set the cluster requested at connect time
    pub fn with_cluster(mut self, cluster: Cluster) -> Self {
        self.config.app.cluster = cluster;
        self
    }

    // ===== Callback Configuration =====

    /// Set the callback redirect base URL
    pub fn with_redirect_base(mut self, redirect_base: impl Into<String>) -> Self {
        self.config.callback.redirect_base = redirect_base.into();
        self
    }

    /// Build the configuration without validation
    pub fn build(self) -> LinkConfig {
        self.config
    }

    /// Build the configuration, validating all settings
    pub fn build_validated(self) -> Result<LinkConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
