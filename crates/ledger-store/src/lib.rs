//! Ledger store for the stock ledger.
//!
//! Holds the raw purchase and sale entries, the derived stock rows and the
//! owner notifications. The store never derives aggregates itself: callers
//! hand it a [`UnitOfWork`] that names every row it touches together with
//! the version it expects to find, and the store applies all of it or none.

pub mod entry;
pub mod error;
pub mod memory;
pub mod notification;
pub mod postgres;
pub mod query;
pub mod stock;
pub mod store;
pub mod unit_of_work;
pub mod version;

pub use common::{EntryId, OwnerId, ProductName};
pub use entry::{CustomerInfo, PurchaseEntry, SaleEntry, SupplierInfo};
pub use error::{Result, StoreError};
pub use memory::InMemoryInventoryStore;
pub use notification::Notification;
pub use postgres::PostgresInventoryStore;
pub use query::LedgerQuery;
pub use stock::{PriceChangeKind, PriceHistoryEntry, StockKey, StockRow};
pub use store::{InventoryStore, InventoryStoreExt};
pub use unit_of_work::{ExpectedVersion, LedgerWrite, StockWrite, UnitOfWork};
pub use version::Version;
