//! Courier Demo CLI
//!
//! Drives a courier client through a complete wallet conversation
//! against an in-process reference wallet: connect, message and
//! transaction signing, and disconnect. The loopback link stands in
//! for the host platform's URL handling, so the whole protocol runs
//! end to end in one process.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use courier_core::{
    callback_channel, Cluster, CourierClient, LinkConfig, LoopbackLink, SessionEvent,
    TransactionBuilder, WalletStore,
};

mod wallet_sim;

use wallet_sim::{DemoTransferBuilder, ReferenceWallet};

/// Courier deep-link demo
///
/// Runs a scripted conversation between a courier client and a
/// reference wallet living in the same process.
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(version, about, long_about = None)]
struct Args {
    /// Wallet base URL (custom scheme or universal link)
    #[arg(long, env = "COURIER_WALLET_BASE", default_value = "courierwallet://v1/")]
    wallet_base: String,

    /// App metadata URL presented to the wallet
    #[arg(long, env = "COURIER_APP_URL", default_value = "https://app.courier-link.dev")]
    app_url: String,

    /// Cluster to request at connect time (mainnet-beta, devnet, testnet)
    #[arg(long, env = "COURIER_CLUSTER", default_value = "devnet")]
    cluster: Cluster,

    /// Callback base URL the wallet redirects back to
    #[arg(long, env = "COURIER_REDIRECT_BASE", default_value = "courierdapp://callbacks/")]
    redirect_base: String,

    /// Message for the signing demo
    #[arg(short, long, env = "COURIER_MESSAGE", default_value = "hello from courier")]
    message: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "COURIER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (plain, json)
    #[arg(long, env = "COURIER_LOG_FORMAT", default_value = "plain")]
    log_format: String,
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    match log_format.to_lowercase().as_str() {
        "json" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        _ => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
    }

    Ok(())
}

/// Build client configuration from CLI arguments
fn build_config(args: &Args) -> Result<LinkConfig> {
    LinkConfig::builder()
        .with_wallet_base(args.wallet_base.clone())
        .with_app_url(args.app_url.clone())
        .with_cluster(args.cluster)
        .with_redirect_base(args.redirect_base.clone())
        .build_validated()
        .context("Invalid configuration")
}

/// Run the scripted conversation
async fn run_demo(client: &CourierClient, wallet: &ReferenceWallet, args: &Args) -> Result<()> {
    // Local custody half of the reference wallet
    let stored = match wallet.load().await? {
        Some(stored) => stored,
        None => wallet.create().await?,
    };
    info!(address = %stored.address, "Reference wallet ready");

    // Connect
    client.connect().await?;
    match client.next_event().await? {
        SessionEvent::Connected { session, address } => {
            info!(%address, session = %session, "Wallet approved the connection");
        }
        other => anyhow::bail!("expected a connect answer, got {:?}", other),
    }

    // Sign a message
    client.sign_message(&args.message).await?;
    match client.next_event().await? {
        SessionEvent::MessageSigned { signature } => {
            info!(signature = %signature, "Message signed");
        }
        other => anyhow::bail!("expected a message signature, got {:?}", other),
    }

    // Transaction flows, assembled through the builder seam
    let from = client
        .wallet_address()
        .await
        .context("session lost its address")?;
    let transfer = DemoTransferBuilder.build_transfer(&from, &stored.address)?;

    client.sign_transaction(&transfer).await?;
    match client.next_event().await? {
        SessionEvent::TransactionSigned { transaction } => {
            info!(transaction = %transaction, "Transaction signed");
        }
        other => anyhow::bail!("expected a signed transaction, got {:?}", other),
    }

    client
        .sign_all_transactions(&[transfer.clone(), transfer.clone()])
        .await?;
    match client.next_event().await? {
        SessionEvent::TransactionsSigned { transactions } => {
            info!(count = transactions.len(), "Transaction batch signed");
        }
        other => anyhow::bail!("expected a signed batch, got {:?}", other),
    }

    client.sign_and_send_transaction(&transfer).await?;
    match client.next_event().await? {
        SessionEvent::TransactionSent { signature } => {
            info!(signature = %signature, "Transaction submitted");
        }
        other => anyhow::bail!("expected a submission signature, got {:?}", other),
    }

    // Local signing through the custody interface
    let local = wallet.sign(args.message.as_bytes()).await?;
    info!(signature = %String::from_utf8_lossy(&local), "Local custody signature");

    // Disconnect
    client.disconnect().await?;
    match client.next_event().await? {
        SessionEvent::Disconnected => info!("Session closed"),
        other => anyhow::bail!("expected a disconnect acknowledgement, got {:?}", other),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, &args.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        wallet = %args.wallet_base,
        cluster = %args.cluster,
        "Starting courier demo"
    );

    // Build configuration
    let config = build_config(&args)?;

    // Wire a client to the reference wallet over a loopback link
    let (link, outbound) = LoopbackLink::new();
    let (sender, inbox) = callback_channel();

    let wallet = ReferenceWallet::new();
    let responder = wallet.spawn(outbound, sender);

    let client = CourierClient::new(config, Arc::new(link), inbox)
        .context("Failed to create courier client")?;

    run_demo(&client, &wallet, &args).await?;

    // Dropping the client closes the loopback channel and lets the
    // responder drain out.
    drop(client);
    let _ = responder.await;

    info!("Demo complete");
    Ok(())
}
