//! Multisig demo binary
//!
//! Runs the two-of-three approval flow against the configured store and
//! prints the resulting transaction and metrics.

use anyhow::Context;
use multisig_core::{Config, MultisigService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting multisig demo");

    // Load configuration
    let config = match std::env::var("MULTISIG_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env()?,
    };

    let service = MultisigService::open(config)?;

    let owners = ["0xAlice", "0xBob", "0xCarol"];
    let wallet = service.create_wallet("Demo Treasury", &owners, 2)?;

    let tx = service
        .submit_transaction(wallet.wallet_id, owners[0], "0xRecipient", 1_000)
        .await?;
    tracing::info!(transaction_id = %tx.transaction_id, status = %tx.status, "Submitted");

    let tx = service.approve_transaction(tx.transaction_id, owners[1]).await?;

    // A third approval arrives after quorum and is refused
    if let Err(err) = service.approve_transaction(tx.transaction_id, owners[2]).await {
        tracing::info!(kind = err.kind(), "Late approval refused: {}", err);
    }

    println!("{}", serde_json::to_string_pretty(&tx)?);
    println!("{}", service.metrics().encode()?);

    tracing::info!("Multisig demo finished");
    Ok(())
}
