//! Chainpay - multi-chain EVM payment tools over stdio JSON-RPC

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chainpay::{EngineConfig, PaymentEngine};
use chainpay_server::Server;
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zeroize::Zeroizing;

/// Chainpay tool server
#[derive(Parser, Debug)]
#[command(name = "chainpay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Default network, e.g. base_sepolia
    #[arg(short, long)]
    network: Option<String>,

    /// Per-transfer ceiling in token units
    #[arg(long)]
    max_transaction_value: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Per-call RPC timeout in seconds
    #[arg(long)]
    rpc_timeout: Option<u64>,
}

// Logs go to stderr; stdout carries protocol frames only.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("chainpay=debug,chainpay_server=debug,chainpay_provider=debug,chainpay_resilience=debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::from_env().context("invalid environment configuration")?;
    if let Some(network) = &args.network {
        config = config.with_default_network(network.trim());
    }
    if let Some(max) = &args.max_transaction_value {
        config = config.with_max_transaction_value(max.trim());
    }
    if let Some(secs) = args.rpc_timeout {
        config = config.with_rpc_timeout(Duration::from_secs(secs));
    }
    if args.debug {
        config = config.with_debug(true);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = load_config(&args)?;
    init_tracing(config.debug);
    let config = config.install().context("invalid configuration")?;

    let engine = PaymentEngine::new(config.clone()).context("failed to start engine")?;

    if let Ok(key) = std::env::var("PRIVATE_KEY") {
        let key = Zeroizing::new(key);
        if !key.trim().is_empty() {
            match engine.wallets().set_user_wallet(&key, None).await {
                Ok(wallet) => tracing::info!(address = %wallet.address, label = %wallet.label, "registered wallet from PRIVATE_KEY"),
                Err(err) => tracing::warn!(error = %err, "ignoring PRIVATE_KEY"),
            }
        }
    }

    let server = Arc::new(Server::new(engine));
    tracing::info!(
        network = %config.default_network,
        max_transaction_value = %config.max_transaction_value,
        tools = server.tools().len(),
        "chainpay server ready on stdio"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    server.serve(stdin, tokio::io::stdout()).await?;

    tracing::info!("chainpay server stopped");
    Ok(())
}
