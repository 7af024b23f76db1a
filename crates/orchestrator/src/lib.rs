//! Inventory transaction orchestration.
//!
//! `InventoryService` turns purchase and sale requests into atomic commits of
//! ledger entries and stock rows. Conflicting concurrent writers are resolved
//! by re-reading and retrying; a failed update is compensated before it
//! returns; committed sales are announced through a [`SaleNotifier`].

pub mod commands;
pub mod config;
pub mod error;
pub mod notifier;
pub mod service;

pub use commands::{CreatePurchase, CreateSale, UpdatePurchase, UpdateSale};
pub use config::ServiceConfig;
pub use error::{ErrorKind, InventoryError, Result};
pub use notifier::{InMemoryNotifier, NotifyError, SaleNotification, SaleNotifier, TracingNotifier};
pub use service::{InventoryService, Recorded, SweepReport};
