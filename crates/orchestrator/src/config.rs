//! Service configuration.

use std::time::Duration;

/// Days a soft-deleted entry is kept before it may be removed.
pub const DEFAULT_GRACE_DAYS: i64 = 3;

/// Commit attempts made before a conflicted operation gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Tunables of the inventory service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How long a soft-deleted entry is retained.
    pub grace_period: chrono::Duration,

    /// Commit attempts per operation, at least one.
    pub max_attempts: u32,

    /// Base delay between attempts; attempt `n` waits `n * backoff`.
    pub backoff: Duration,
}

impl ServiceConfig {
    pub fn with_grace_days(mut self, days: i64) -> Self {
        self.grace_period = chrono::Duration::days(days);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            grace_period: chrono::Duration::days(DEFAULT_GRACE_DAYS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(5),
        }
    }
}
