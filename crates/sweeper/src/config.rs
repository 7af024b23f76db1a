//! Sweeper configuration loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use orchestrator::ServiceConfig;
use orchestrator::config::{DEFAULT_GRACE_DAYS, DEFAULT_MAX_ATTEMPTS};

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_METRICS_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 9000);

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Sweeper configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: PostgreSQL connection string (default: unset, in-memory store)
/// - `SWEEP_INTERVAL_SECS`: seconds between sweeps (default: `3600`)
/// - `RETENTION_GRACE_DAYS`: days a soft-deleted entry is kept (default: `3`)
/// - `MAX_COMMIT_ATTEMPTS`: commit attempts per operation (default: `5`)
/// - `METRICS_ADDR`: Prometheus listener address (default: `"0.0.0.0:9000"`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` or `pretty` (default: `"pretty"`)
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub database_url: Option<String>,
    pub sweep_interval: Duration,
    pub grace_days: i64,
    pub max_attempts: u32,
    pub metrics_addr: SocketAddr,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl SweeperConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            sweep_interval: lookup("SWEEP_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            grace_days: lookup("RETENTION_GRACE_DAYS")
                .and_then(|d| d.parse().ok())
                .filter(|days| *days >= 0)
                .unwrap_or(defaults.grace_days),
            max_attempts: lookup("MAX_COMMIT_ATTEMPTS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_attempts),
            metrics_addr: lookup("METRICS_ADDR")
                .and_then(|a| a.parse().ok())
                .unwrap_or(defaults.metrics_addr),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
        }
    }

    /// Returns the service configuration the sweeper runs with.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::default()
            .with_grace_days(self.grace_days)
            .with_max_attempts(self.max_attempts)
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            grace_days: DEFAULT_GRACE_DAYS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            metrics_addr: SocketAddr::from(DEFAULT_METRICS_ADDR),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
