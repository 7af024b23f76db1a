use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{EntryId, OwnerId, ProductName};

use crate::{LedgerQuery, PurchaseEntry, Result, SaleEntry, StockRow, UnitOfWork};

/// Core trait for ledger store implementations.
///
/// Every read is scoped to one owner: an entry id that belongs to another
/// owner is reported as missing. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Applies a unit of work atomically.
    ///
    /// Every stock row and replaced or deleted entry is compared against the
    /// version the unit expects. If any differs, or an insert collides with
    /// an existing key, nothing is written and the call fails with
    /// `ConcurrencyConflict`.
    async fn commit(&self, unit: UnitOfWork) -> Result<()>;

    /// Retrieves the stock row for one product.
    async fn get_stock(&self, owner: OwnerId, product_name: &ProductName)
    -> Result<Option<StockRow>>;

    /// Retrieves every stock row of an owner, ordered by product name.
    async fn list_stock(&self, owner: OwnerId) -> Result<Vec<StockRow>>;

    /// Retrieves a purchase, soft-deleted or not.
    async fn get_purchase(&self, owner: OwnerId, id: EntryId) -> Result<Option<PurchaseEntry>>;

    /// Retrieves purchases matching a query, newest first.
    async fn list_purchases(
        &self,
        owner: OwnerId,
        query: LedgerQuery,
    ) -> Result<Vec<PurchaseEntry>>;

    /// Retrieves a sale, soft-deleted or not.
    async fn get_sale(&self, owner: OwnerId, id: EntryId) -> Result<Option<SaleEntry>>;

    /// Retrieves sales matching a query, newest first.
    async fn list_sales(&self, owner: OwnerId, query: LedgerQuery) -> Result<Vec<SaleEntry>>;

    /// Removes purchases soft-deleted at or before `cutoff`.
    ///
    /// Scoped to one owner when given, otherwise global. Stock rows are not
    /// touched. Returns the number of removed entries.
    async fn purge_purchases(&self, owner: Option<OwnerId>, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Removes sales soft-deleted at or before `cutoff`.
    async fn purge_sales(&self, owner: Option<OwnerId>, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Counts the owner's unread notifications.
    async fn unread_notifications(&self, owner: OwnerId) -> Result<u64>;
}

/// Extension trait providing convenience methods for ledger stores.
#[async_trait]
pub trait InventoryStoreExt: InventoryStore {
    /// Checks if an owner holds a stock row for a product.
    async fn stock_exists(&self, owner: OwnerId, product_name: &ProductName) -> Result<bool> {
        Ok(self.get_stock(owner, product_name).await?.is_some())
    }
}

// Blanket implementation for all InventoryStore implementations
impl<T: InventoryStore + ?Sized> InventoryStoreExt for T {}
