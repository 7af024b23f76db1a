//! Retention sweeper entry point.

use ledger_store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore};
use metrics_exporter_prometheus::PrometheusBuilder;
use orchestrator::{InventoryService, TracingNotifier};
use sqlx::postgres::PgPoolOptions;
use sweeper::{Result, SweeperConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration and initialize tracing
    let config = SweeperConfig::from_env();
    sweeper::init_tracing(&config);

    // 2. Install Prometheus metrics recorder with its own listener
    PrometheusBuilder::new()
        .with_http_listener(config.metrics_addr)
        .install()?;
    tracing::info!(addr = %config.metrics_addr, "serving Prometheus metrics");

    // 3. Pick the ledger store
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let store = PostgresInventoryStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("connected to PostgreSQL ledger store");
            run(store, &config).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, sweeping an in-memory store");
            run(InMemoryInventoryStore::new(), &config).await
        }
    }
}

async fn run<S: InventoryStore>(store: S, config: &SweeperConfig) -> Result<()> {
    let service = InventoryService::new(store, TracingNotifier).with_config(config.service_config());

    tracing::info!(
        interval_secs = config.sweep_interval.as_secs(),
        grace_days = config.grace_days,
        "starting retention sweeper"
    );
    let runs = sweeper::run_sweeps(&service, config.sweep_interval, sweeper::shutdown_signal()).await;

    tracing::info!(runs, "sweeper shut down gracefully");
    Ok(())
}
