//! Wallet transaction submitter
//!
//! Submits the transaction described in the `[submission]` config section,
//! waits for it to finalize and prints the outcome as JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use wallet_tx_submitter::chain::ChainProvider;
use wallet_tx_submitter::config::{LoggingConfig, Settings};
use wallet_tx_submitter::metrics::MetricsServer;
use wallet_tx_submitter::tx::{
    ChainErrorValidator, FinalizationResult, LocalWalletSigner, ProviderGasEstimator,
    ProviderGasPriceOracle, RpcCallSimulator, TransactionEvent, TransactionSubmitter,
    WalletTransaction,
};

#[derive(Debug, Serialize)]
struct SubmissionReport {
    chain_id: u64,
    transaction_hash: Option<ethers::types::H256>,
    finalization: FinalizationResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    init_logging(&settings.logging);

    info!("Starting wallet transaction submitter v{}", env!("CARGO_PKG_VERSION"));

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    let submission = settings
        .submission
        .clone()
        .context("No [submission] section configured")?;

    let provider = Arc::new(ChainProvider::new(settings.chain.clone())?);
    let wallet = LocalWalletSigner::load_wallet(&settings.wallet)?;
    let signer = Arc::new(LocalWalletSigner::new(
        wallet,
        provider.clone(),
        Duration::from_millis(settings.submitter.receipt_poll_interval_ms),
    ));

    let mut submitter = TransactionSubmitter::new(
        Arc::new(ProviderGasEstimator::new(settings.submitter.gas_limit_buffer_percent)),
        Arc::new(ProviderGasPriceOracle::new(settings.submitter.gas_price_buffer_percent)),
        Arc::new(ChainErrorValidator::new()),
    );
    if settings.simulation.enabled {
        info!("Simulation enabled, nothing will be broadcast");
        submitter = submitter.with_simulation(Arc::new(RpcCallSimulator::new()));
    }

    let chain_id = provider.chain_id();
    let mut tx = WalletTransaction::new(chain_id, signer, submission.to, submission.data)
        .callback(log_event);
    if let Some(value) = submission.value {
        tx = tx.value(value);
    }
    if let Some(gas_limit) = submission.gas_limit {
        tx = tx.gas_limit(gas_limit);
    }
    if let Some(nonce) = submission.nonce {
        tx = tx.nonce(nonce);
    }
    if let Some(memo) = submission.memo {
        tx = tx.memo(memo);
    }

    // Refuse to sign against an unreachable node
    let reachability = provider.clone();
    tx = tx.pre_submission_hook(move || async move {
        reachability.get_block_number().await.map(|_| ())
    });

    let result = submitter.send_wallet_transaction(tx).await?;

    let finalization = tokio::select! {
        finalization = result.wait() => finalization?,
        _ = shutdown_signal() => {
            warn!("Shutdown signal received before finalization");
            if let Some(h) = metrics_handle {
                h.abort();
            }
            return Ok(());
        }
    };

    let report = SubmissionReport {
        chain_id,
        transaction_hash: result.transaction_hash,
        finalization,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("Wallet transaction submitter stopped");
    Ok(())
}

fn log_event(event: TransactionEvent) {
    info!(event = event.name(), terminal = event.is_terminal(), "Lifecycle event");
}

fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wallet_tx_submitter=debug,hyper=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
