//! Sale notification sink.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use common::{OwnerId, ProductName};
use ledger_store::SaleEntry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Details of a committed sale, handed to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleNotification {
    pub owner: OwnerId,
    pub owner_email: Option<String>,
    pub product_name: ProductName,
    pub quantity: Decimal,
    pub price: Decimal,
    pub customer_name: String,
    pub customer_number: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SaleNotification {
    pub fn for_sale(sale: &SaleEntry, owner_email: Option<String>) -> Self {
        Self {
            owner: sale.owner,
            owner_email,
            product_name: sale.product_name.clone(),
            quantity: sale.quantity,
            price: sale.price,
            customer_name: sale.customer.name.clone(),
            customer_number: sale.customer.number.clone(),
            date: sale.date,
            time: sale.time,
        }
    }
}

/// Errors a notifier may report. They never reach the caller of the sale.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Destination for sale notifications.
#[async_trait]
pub trait SaleNotifier: Send + Sync + 'static {
    async fn notify(&self, notification: SaleNotification) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl SaleNotifier for TracingNotifier {
    async fn notify(&self, notification: SaleNotification) -> Result<(), NotifyError> {
        tracing::info!(
            owner = %notification.owner,
            product = %notification.product_name,
            quantity = %notification.quantity,
            price = %notification.price,
            customer = %notification.customer_name,
            has_email = notification.owner_email.is_some(),
            "sale recorded"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<SaleNotification>,
    attempts: usize,
    fail: bool,
}

/// Notifier that records what it was sent, for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every delivery.
    pub fn set_fail(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail = fail;
    }

    /// Returns the notifications delivered so far.
    pub fn sent(&self) -> Vec<SaleNotification> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .clone()
    }

    /// Returns how many deliveries were attempted, failed ones included.
    pub fn attempts(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .attempts
    }

    /// Waits until at least `count` deliveries were attempted.
    ///
    /// Returns false if `timeout` elapses first.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        let poll = async {
            while self.attempts() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.is_ok()
    }
}

#[async_trait]
impl SaleNotifier for InMemoryNotifier {
    async fn notify(&self, notification: SaleNotification) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.attempts += 1;

        if state.fail {
            return Err(NotifyError::Delivery("mail relay unavailable".to_string()));
        }

        state.sent.push(notification);
        Ok(())
    }
}
