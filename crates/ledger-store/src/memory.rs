use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{EntryId, OwnerId, ProductName};
use tokio::sync::RwLock;

use crate::{
    LedgerQuery, Notification, PurchaseEntry, Result, SaleEntry, StockKey, StockRow, StoreError,
    Version,
    store::InventoryStore,
    unit_of_work::{LedgerWrite, UnitOfWork, validate_unit_of_work},
};

#[derive(Debug, Default)]
struct State {
    purchases: HashMap<EntryId, PurchaseEntry>,
    sales: HashMap<EntryId, SaleEntry>,
    stock: BTreeMap<StockKey, StockRow>,
    notifications: Vec<Notification>,
}

impl State {
    fn purchase_version(&self, owner: OwnerId, id: EntryId) -> Version {
        self.purchases
            .get(&id)
            .filter(|e| e.owner == owner)
            .map(|e| e.version)
            .unwrap_or(Version::initial())
    }

    fn sale_version(&self, owner: OwnerId, id: EntryId) -> Version {
        self.sales
            .get(&id)
            .filter(|e| e.owner == owner)
            .map(|e| e.version)
            .unwrap_or(Version::initial())
    }

    /// Checks every expectation of the unit against the current state.
    fn check(&self, unit: &UnitOfWork) -> Result<()> {
        for write in &unit.stock {
            let key = write.row.key();
            let actual = self
                .stock
                .get(&key)
                .map(|r| r.version)
                .unwrap_or(Version::initial());
            let expected = write.expected.as_version();
            if actual != expected {
                return Err(conflict(key.to_string(), expected, actual));
            }
        }

        for write in &unit.ledger {
            match write {
                LedgerWrite::InsertPurchase(entry) => {
                    // Ids are global, so an id taken by any owner collides.
                    if let Some(existing) = self.purchases.get(&entry.id) {
                        return Err(conflict(
                            format!("purchase {}", entry.id),
                            Version::initial(),
                            existing.version,
                        ));
                    }
                }
                LedgerWrite::ReplacePurchase { entry, expected } => {
                    let actual = self.purchase_version(entry.owner, entry.id);
                    if actual != *expected {
                        return Err(conflict(format!("purchase {}", entry.id), *expected, actual));
                    }
                }
                LedgerWrite::DeletePurchase {
                    owner,
                    id,
                    expected,
                } => {
                    let actual = self.purchase_version(*owner, *id);
                    if actual != *expected {
                        return Err(conflict(format!("purchase {id}"), *expected, actual));
                    }
                }
                LedgerWrite::InsertSale(entry) => {
                    if let Some(existing) = self.sales.get(&entry.id) {
                        return Err(conflict(
                            format!("sale {}", entry.id),
                            Version::initial(),
                            existing.version,
                        ));
                    }
                }
                LedgerWrite::ReplaceSale { entry, expected } => {
                    let actual = self.sale_version(entry.owner, entry.id);
                    if actual != *expected {
                        return Err(conflict(format!("sale {}", entry.id), *expected, actual));
                    }
                }
                LedgerWrite::DeleteSale {
                    owner,
                    id,
                    expected,
                } => {
                    let actual = self.sale_version(*owner, *id);
                    if actual != *expected {
                        return Err(conflict(format!("sale {id}"), *expected, actual));
                    }
                }
                LedgerWrite::InsertNotification(_) => {}
            }
        }

        Ok(())
    }

    /// Applies a unit that already passed `check`.
    fn apply(&mut self, unit: UnitOfWork) {
        for write in unit.ledger {
            match write {
                LedgerWrite::InsertPurchase(entry) | LedgerWrite::ReplacePurchase { entry, .. } => {
                    self.purchases.insert(entry.id, entry);
                }
                LedgerWrite::DeletePurchase { id, .. } => {
                    self.purchases.remove(&id);
                }
                LedgerWrite::InsertSale(entry) | LedgerWrite::ReplaceSale { entry, .. } => {
                    self.sales.insert(entry.id, entry);
                }
                LedgerWrite::DeleteSale { id, .. } => {
                    self.sales.remove(&id);
                }
                LedgerWrite::InsertNotification(notification) => {
                    self.notifications.push(notification);
                }
            }
        }

        for write in unit.stock {
            self.stock.insert(write.row.key(), write.row);
        }
    }
}

fn conflict(resource: String, expected: Version, actual: Version) -> StoreError {
    StoreError::ConcurrencyConflict {
        resource,
        expected,
        actual,
    }
}

/// In-memory ledger store implementation for testing and local runs.
///
/// A commit checks every expectation and applies every write under one
/// write lock, which gives the same all-or-nothing behavior as the
/// PostgreSQL transaction.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of purchases and sales stored, deleted ones included.
    pub async fn entry_count(&self) -> usize {
        let state = self.state.read().await;
        state.purchases.len() + state.sales.len()
    }

    /// Returns every notification recorded for an owner, oldest first.
    pub async fn notifications(&self, owner: OwnerId) -> Vec<Notification> {
        let state = self.state.read().await;
        state
            .notifications
            .iter()
            .filter(|n| n.owner == owner)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn commit(&self, unit: UnitOfWork) -> Result<()> {
        validate_unit_of_work(&unit)?;

        let mut state = self.state.write().await;
        if let Err(err) = state.check(&unit) {
            tracing::debug!(error = %err, "rejected unit of work");
            return Err(err);
        }
        state.apply(unit);
        Ok(())
    }

    async fn get_stock(
        &self,
        owner: OwnerId,
        product_name: &ProductName,
    ) -> Result<Option<StockRow>> {
        let state = self.state.read().await;
        Ok(state
            .stock
            .get(&StockKey::new(owner, product_name.clone()))
            .cloned())
    }

    async fn list_stock(&self, owner: OwnerId) -> Result<Vec<StockRow>> {
        let state = self.state.read().await;
        // BTreeMap keys order by owner then product name.
        Ok(state
            .stock
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect())
    }

    async fn get_purchase(&self, owner: OwnerId, id: EntryId) -> Result<Option<PurchaseEntry>> {
        let state = self.state.read().await;
        Ok(state
            .purchases
            .get(&id)
            .filter(|e| e.owner == owner)
            .cloned())
    }

    async fn list_purchases(
        &self,
        owner: OwnerId,
        query: LedgerQuery,
    ) -> Result<Vec<PurchaseEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state
            .purchases
            .values()
            .filter(|e| e.owner == owner && query.matches(e.deleted, &e.product_name))
            .cloned()
            .collect();

        entries.sort_by(|a, b| {
            (b.date, b.time, b.created_at, b.id).cmp(&(a.date, a.time, a.created_at, a.id))
        });

        Ok(query.paginate(entries))
    }

    async fn get_sale(&self, owner: OwnerId, id: EntryId) -> Result<Option<SaleEntry>> {
        let state = self.state.read().await;
        Ok(state.sales.get(&id).filter(|e| e.owner == owner).cloned())
    }

    async fn list_sales(&self, owner: OwnerId, query: LedgerQuery) -> Result<Vec<SaleEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state
            .sales
            .values()
            .filter(|e| e.owner == owner && query.matches(e.deleted, &e.product_name))
            .cloned()
            .collect();

        entries.sort_by(|a, b| {
            (b.date, b.time, b.created_at, b.id).cmp(&(a.date, a.time, a.created_at, a.id))
        });

        Ok(query.paginate(entries))
    }

    async fn purge_purchases(&self, owner: Option<OwnerId>, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.purchases.len();
        state
            .purchases
            .retain(|_, e| !(owner.is_none_or(|o| e.owner == o) && e.purge_eligible(cutoff)));
        Ok((before - state.purchases.len()) as u64)
    }

    async fn purge_sales(&self, owner: Option<OwnerId>, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.sales.len();
        state
            .sales
            .retain(|_, e| !(owner.is_none_or(|o| e.owner == o) && e.purge_eligible(cutoff)));
        Ok((before - state.sales.len()) as u64)
    }

    async fn unread_notifications(&self, owner: OwnerId) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.owner == owner && !n.read)
            .count() as u64)
    }
}
