//! Staging area for the stock rows one operation touches.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{OwnerId, ProductName};
use ledger_store::{
    ExpectedVersion, InventoryStore, PurchaseEntry, SaleEntry, StockRow, StockWrite, Version,
};

use crate::{
    StockError,
    engine::{self, StockLevel},
};

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    /// Version the row had when it was read, `None` if it did not exist.
    loaded: Option<Version>,
    row: Option<StockRow>,
    touched: bool,
}

/// Snapshot of a workset, taken before a multi-step change.
#[derive(Debug, Clone, PartialEq)]
pub struct WorksetCheckpoint(BTreeMap<ProductName, Slot>);

/// Stock rows of one owner staged for a single unit of work.
///
/// The workset remembers the version each row had when it was read. Engine
/// operations run against the staged copies, and [`StockWorkset::into_writes`]
/// turns every touched row into a [`StockWrite`] that expects the remembered
/// version. A product that was never loaded is treated as absent, so writing
/// it expects a new row.
#[derive(Debug, Clone)]
pub struct StockWorkset {
    owner: OwnerId,
    slots: BTreeMap<ProductName, Slot>,
}

impl StockWorkset {
    /// Creates an empty workset for an owner.
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            slots: BTreeMap::new(),
        }
    }

    /// Reads the current rows for the given products.
    pub async fn load<S>(
        store: &S,
        owner: OwnerId,
        product_names: impl IntoIterator<Item = ProductName>,
    ) -> ledger_store::Result<Self>
    where
        S: InventoryStore + ?Sized,
    {
        let mut workset = Self::new(owner);
        for product_name in product_names {
            if workset.slots.contains_key(&product_name) {
                continue;
            }
            let row = store.get_stock(owner, &product_name).await?;
            workset.insert_loaded(product_name, row);
        }
        Ok(workset)
    }

    /// Records a row as read from storage.
    pub fn insert_loaded(&mut self, product_name: ProductName, row: Option<StockRow>) {
        self.slots.insert(
            product_name,
            Slot {
                loaded: row.as_ref().map(|r| r.version),
                row,
                touched: false,
            },
        );
    }

    /// Returns the staged row for a product.
    pub fn row(&self, product_name: &ProductName) -> Option<&StockRow> {
        self.slots.get(product_name).and_then(|s| s.row.as_ref())
    }

    /// Returns true if any staged row changed.
    pub fn is_dirty(&self) -> bool {
        self.slots.values().any(|s| s.touched)
    }

    pub fn apply_purchase(
        &mut self,
        purchase: &PurchaseEntry,
        at: DateTime<Utc>,
    ) -> Result<&StockRow, StockError> {
        let next = engine::apply_purchase(self.row(&purchase.product_name), purchase, at)?;
        Ok(self.stage(next))
    }

    pub fn apply_sale(&mut self, sale: &SaleEntry, at: DateTime<Utc>) -> Result<&StockRow, StockError> {
        let next = engine::apply_sale(self.row(&sale.product_name), sale, at)?;
        Ok(self.stage(next))
    }

    pub fn reverse_purchase(
        &mut self,
        purchase: &PurchaseEntry,
        at: DateTime<Utc>,
    ) -> Result<&StockRow, StockError> {
        let next = engine::reverse_purchase(self.row(&purchase.product_name), purchase, at)?;
        Ok(self.stage(next))
    }

    pub fn reverse_sale(
        &mut self,
        sale: &SaleEntry,
        at: DateTime<Utc>,
    ) -> Result<&StockRow, StockError> {
        let next = engine::reverse_sale(self.row(&sale.product_name), sale, at)?;
        Ok(self.stage(next))
    }

    pub fn set_level(&mut self, level: &StockLevel, at: DateTime<Utc>) -> Result<&StockRow, StockError> {
        let next = engine::set_level(self.row(&level.product_name), self.owner, level, at)?;
        Ok(self.stage(next))
    }

    fn stage(&mut self, row: StockRow) -> &StockRow {
        let slot = self
            .slots
            .entry(row.product_name.clone())
            .or_insert(Slot {
                loaded: None,
                row: None,
                touched: false,
            });
        slot.touched = true;
        slot.row.insert(row)
    }

    /// Captures the staged state.
    pub fn checkpoint(&self) -> WorksetCheckpoint {
        WorksetCheckpoint(self.slots.clone())
    }

    /// Puts the staged state back to a checkpoint.
    pub fn restore(&mut self, checkpoint: WorksetCheckpoint) {
        self.slots = checkpoint.0;
    }

    /// Converts every touched row into a version-checked stock write.
    ///
    /// Each row is written one version past the version it was read at,
    /// however many engine operations touched it.
    pub fn into_writes(self) -> Vec<StockWrite> {
        self.slots
            .into_values()
            .filter(|slot| slot.touched)
            .filter_map(|slot| {
                let mut row = slot.row?;
                let expected = match slot.loaded {
                    Some(version) => ExpectedVersion::Exact(version),
                    None => ExpectedVersion::New,
                };
                row.version = expected.written_version();
                Some(StockWrite { row, expected })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::EntryId;
    use ledger_store::{
        InMemoryInventoryStore, LedgerWrite, SupplierInfo, UnitOfWork,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn product(name: &str) -> ProductName {
        ProductName::parse(name).unwrap()
    }

    fn purchase(owner: OwnerId, name: &str, quantity: Decimal) -> PurchaseEntry {
        let now = Utc::now();
        PurchaseEntry {
            id: EntryId::new(),
            owner,
            supplier: SupplierInfo {
                name: "Efua".to_string(),
                location: "Cape Coast".to_string(),
                company: None,
            },
            product_name: product(name),
            quantity,
            unit_price: dec!(2),
            date: now.date_naive(),
            time: now.time(),
            notes: None,
            deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            version: Version::first(),
        }
    }

    #[test]
    fn untouched_workset_produces_no_writes() {
        let mut workset = StockWorkset::new(OwnerId::new());
        workset.insert_loaded(product("Tile"), None);
        assert!(!workset.is_dirty());
        assert!(workset.into_writes().is_empty());
    }

    #[test]
    fn new_row_is_written_as_insert() {
        let owner = OwnerId::new();
        let mut workset = StockWorkset::new(owner);
        workset
            .apply_purchase(&purchase(owner, "Tile", dec!(3)), Utc::now())
            .unwrap();

        let writes = workset.into_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].expected, ExpectedVersion::New);
        assert_eq!(writes[0].row.version, Version::first());
    }

    #[test]
    fn repeated_changes_advance_version_once() {
        let owner = OwnerId::new();
        let mut seeded = StockWorkset::new(owner);
        seeded
            .apply_purchase(&purchase(owner, "Tile", dec!(3)), Utc::now())
            .unwrap();
        let mut row = seeded.into_writes().remove(0).row;
        row.version = Version::new(4);

        let mut workset = StockWorkset::new(owner);
        workset.insert_loaded(product("Tile"), Some(row));
        workset
            .apply_purchase(&purchase(owner, "Tile", dec!(1)), Utc::now())
            .unwrap();
        workset
            .apply_purchase(&purchase(owner, "Tile", dec!(1)), Utc::now())
            .unwrap();

        let writes = workset.into_writes();
        assert_eq!(writes[0].expected, ExpectedVersion::Exact(Version::new(4)));
        assert_eq!(writes[0].row.version, Version::new(5));
        assert_eq!(writes[0].row.quantity, dec!(5));
    }

    #[test]
    fn restore_returns_to_checkpoint() {
        let owner = OwnerId::new();
        let mut workset = StockWorkset::new(owner);
        workset
            .apply_purchase(&purchase(owner, "Tile", dec!(3)), Utc::now())
            .unwrap();
        let checkpoint = workset.checkpoint();

        workset
            .apply_purchase(&purchase(owner, "Grout", dec!(9)), Utc::now())
            .unwrap();
        workset.restore(checkpoint.clone());

        assert_eq!(workset.checkpoint(), checkpoint);
        assert!(workset.row(&product("Grout")).is_none());
    }

    #[tokio::test]
    async fn loaded_rows_commit_with_their_read_version() {
        let store = InMemoryInventoryStore::new();
        let owner = OwnerId::new();
        let first = purchase(owner, "Tile", dec!(3));

        let mut workset = StockWorkset::load(&store, owner, [product("Tile")]).await.unwrap();
        workset.apply_purchase(&first, Utc::now()).unwrap();
        store
            .commit(
                UnitOfWork::new()
                    .with_ledger(LedgerWrite::InsertPurchase(first))
                    .with_stock_writes(workset.into_writes()),
            )
            .await
            .unwrap();

        // Two worksets read the same version; only the first commit wins.
        let mut a = StockWorkset::load(&store, owner, [product("Tile")]).await.unwrap();
        let mut b = StockWorkset::load(&store, owner, [product("Tile")]).await.unwrap();
        a.apply_purchase(&purchase(owner, "Tile", dec!(1)), Utc::now())
            .unwrap();
        b.apply_purchase(&purchase(owner, "Tile", dec!(2)), Utc::now())
            .unwrap();

        store
            .commit(UnitOfWork::new().with_stock_writes(a.into_writes()))
            .await
            .unwrap();
        let err = store
            .commit(UnitOfWork::new().with_stock_writes(b.into_writes()))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let row = store.get_stock(owner, &product("Tile")).await.unwrap().unwrap();
        assert_eq!(row.quantity, dec!(4));
        assert_eq!(row.version, Version::new(2));
    }
}
