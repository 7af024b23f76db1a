//! Sweeper startup errors.

use ledger_store::StoreError;
use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

/// Errors that stop the sweeper from starting.
///
/// Failures of individual sweeps are logged and retried on the next tick
/// instead.
#[derive(Debug, Error)]
pub enum SweeperError {
    /// Could not connect to the database.
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    /// The ledger store could not be prepared.
    #[error("Ledger store error: {0}")]
    Store(#[from] StoreError),

    /// The Prometheus exporter could not be installed.
    #[error("Metrics exporter error: {0}")]
    Metrics(#[from] BuildError),
}

pub type Result<T> = std::result::Result<T, SweeperError>;
