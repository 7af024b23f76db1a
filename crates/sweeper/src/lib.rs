//! Retention sweeper for the stock ledger.
//!
//! Periodically removes ledger entries that were soft-deleted longer than
//! the retention grace period ago, until a shutdown signal arrives.

pub mod config;
pub mod error;

use std::future::Future;
use std::time::Duration;

use common::Clock;
use ledger_store::InventoryStore;
use orchestrator::{InventoryService, SaleNotifier, SweepReport};
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use config::{LogFormat, SweeperConfig};
pub use error::{Result, SweeperError};

/// Installs the global tracing subscriber.
pub fn init_tracing(config: &SweeperConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Runs one global sweep and records its outcome.
pub async fn sweep_once<S, N, C>(service: &InventoryService<S, N, C>) -> Option<SweepReport>
where
    S: InventoryStore,
    N: SaleNotifier,
    C: Clock,
{
    match service.sweep_retention(None).await {
        Ok(report) => {
            metrics::counter!("sweeper_runs_total", "outcome" => "ok").increment(1);
            tracing::debug!(removed = report.total(), "sweep finished");
            Some(report)
        }
        Err(err) => {
            metrics::counter!("sweeper_runs_total", "outcome" => "error").increment(1);
            tracing::error!(error = %err, "sweep failed, retrying on next tick");
            None
        }
    }
}

/// Sweeps every `interval` until `shutdown` completes.
///
/// The first sweep runs immediately. Returns the number of sweeps run.
pub async fn run_sweeps<S, N, C>(
    service: &InventoryService<S, N, C>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> u64
where
    S: InventoryStore,
    N: SaleNotifier,
    C: Clock,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut runs = 0;
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                sweep_once(service).await;
                runs += 1;
            }
        }
    }
    runs
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
