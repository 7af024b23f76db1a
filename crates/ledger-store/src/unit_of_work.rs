//! Atomic batches of ledger and stock writes.

use std::collections::HashSet;

use common::{EntryId, OwnerId};
use rust_decimal::Decimal;

use crate::{Notification, PurchaseEntry, SaleEntry, StockKey, StockRow, Version};

/// Version a stock row is expected to be at when the unit of work commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// The row must not exist yet.
    New,
    /// The row must exist at exactly this version.
    Exact(Version),
}

impl ExpectedVersion {
    /// Returns the expected version, `Version::initial()` for a new row.
    pub fn as_version(&self) -> Version {
        match self {
            ExpectedVersion::New => Version::initial(),
            ExpectedVersion::Exact(version) => *version,
        }
    }

    /// Returns the version the written row must carry.
    pub fn written_version(&self) -> Version {
        self.as_version().next()
    }
}

/// One write against the ledger tables.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerWrite {
    InsertPurchase(PurchaseEntry),
    ReplacePurchase {
        entry: PurchaseEntry,
        expected: Version,
    },
    DeletePurchase {
        owner: OwnerId,
        id: EntryId,
        expected: Version,
    },
    InsertSale(SaleEntry),
    ReplaceSale {
        entry: SaleEntry,
        expected: Version,
    },
    DeleteSale {
        owner: OwnerId,
        id: EntryId,
        expected: Version,
    },
    InsertNotification(Notification),
}

impl LedgerWrite {
    fn target(&self) -> Option<(&'static str, OwnerId, EntryId)> {
        match self {
            LedgerWrite::InsertPurchase(entry) | LedgerWrite::ReplacePurchase { entry, .. } => {
                Some(("purchase", entry.owner, entry.id))
            }
            LedgerWrite::DeletePurchase { owner, id, .. } => Some(("purchase", *owner, *id)),
            LedgerWrite::InsertSale(entry) | LedgerWrite::ReplaceSale { entry, .. } => {
                Some(("sale", entry.owner, entry.id))
            }
            LedgerWrite::DeleteSale { owner, id, .. } => Some(("sale", *owner, *id)),
            LedgerWrite::InsertNotification(_) => None,
        }
    }
}

/// Full replacement of one stock row.
#[derive(Debug, Clone, PartialEq)]
pub struct StockWrite {
    pub row: StockRow,
    pub expected: ExpectedVersion,
}

/// Everything one operation writes, committed all or nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    pub ledger: Vec<LedgerWrite>,
    pub stock: Vec<StockWrite>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(mut self, write: LedgerWrite) -> Self {
        self.ledger.push(write);
        self
    }

    pub fn with_stock(mut self, write: StockWrite) -> Self {
        self.stock.push(write);
        self
    }

    pub fn with_stock_writes(mut self, writes: impl IntoIterator<Item = StockWrite>) -> Self {
        self.stock.extend(writes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty() && self.stock.is_empty()
    }

    /// Keys of every stock row this unit touches.
    pub fn stock_keys(&self) -> Vec<StockKey> {
        self.stock.iter().map(|w| w.row.key()).collect()
    }
}

/// Error returned when a unit of work is malformed.
#[derive(Debug, Clone)]
pub struct UnitOfWorkValidationError {
    pub message: String,
}

impl std::fmt::Display for UnitOfWorkValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UnitOfWorkValidationError {}

impl From<UnitOfWorkValidationError> for crate::StoreError {
    fn from(err: UnitOfWorkValidationError) -> Self {
        crate::StoreError::InvalidUnitOfWork(err.message)
    }
}

fn invalid(message: impl Into<String>) -> UnitOfWorkValidationError {
    UnitOfWorkValidationError {
        message: message.into(),
    }
}

/// Validates a unit of work before any row is touched.
///
/// Both store implementations call this first so that a unit rejected here
/// never reaches storage.
pub fn validate_unit_of_work(
    unit: &UnitOfWork,
) -> std::result::Result<(), UnitOfWorkValidationError> {
    if unit.is_empty() {
        return Err(invalid("Cannot commit an empty unit of work"));
    }

    let mut stock_keys = HashSet::new();
    for write in &unit.stock {
        let key = write.row.key();
        if !stock_keys.insert(key.clone()) {
            return Err(invalid(format!("{key} is written twice")));
        }
        write.row.check_invariants().map_err(invalid)?;
        if write.row.version != write.expected.written_version() {
            return Err(invalid(format!(
                "{key} carries version {} but must be written at {}",
                write.row.version,
                write.expected.written_version()
            )));
        }
    }

    let mut entries = HashSet::new();
    for write in &unit.ledger {
        if let Some(target) = write.target()
            && !entries.insert(target)
        {
            let (kind, _, id) = target;
            return Err(invalid(format!("{kind} {id} is written twice")));
        }

        match write {
            LedgerWrite::InsertPurchase(entry) => {
                check_purchase(entry)?;
                check_written_version(entry.version, Version::first(), "purchase", entry.id)?;
            }
            LedgerWrite::ReplacePurchase { entry, expected } => {
                check_purchase(entry)?;
                check_written_version(entry.version, expected.next(), "purchase", entry.id)?;
            }
            LedgerWrite::InsertSale(entry) => {
                check_sale(entry)?;
                check_written_version(entry.version, Version::first(), "sale", entry.id)?;
            }
            LedgerWrite::ReplaceSale { entry, expected } => {
                check_sale(entry)?;
                check_written_version(entry.version, expected.next(), "sale", entry.id)?;
            }
            LedgerWrite::DeletePurchase { .. }
            | LedgerWrite::DeleteSale { .. }
            | LedgerWrite::InsertNotification(_) => {}
        }
    }

    Ok(())
}

fn check_purchase(entry: &PurchaseEntry) -> std::result::Result<(), UnitOfWorkValidationError> {
    if entry.quantity <= Decimal::ZERO || entry.unit_price <= Decimal::ZERO {
        return Err(invalid(format!(
            "purchase {} must have positive quantity and unit price",
            entry.id
        )));
    }
    Ok(())
}

fn check_sale(entry: &SaleEntry) -> std::result::Result<(), UnitOfWorkValidationError> {
    if entry.quantity <= Decimal::ZERO || entry.price <= Decimal::ZERO {
        return Err(invalid(format!(
            "sale {} must have positive quantity and price",
            entry.id
        )));
    }
    if entry.quantity.checked_mul(entry.price) != Some(entry.total_price) {
        return Err(invalid(format!(
            "sale {} total price does not equal quantity x price",
            entry.id
        )));
    }
    Ok(())
}

fn check_written_version(
    actual: Version,
    required: Version,
    kind: &str,
    id: EntryId,
) -> std::result::Result<(), UnitOfWorkValidationError> {
    if actual != required {
        return Err(invalid(format!(
            "{kind} {id} carries version {actual} but must be written at {required}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::{DEFAULT_LOW_STOCK_THRESHOLD, UNKNOWN_SUPPLIER};
    use chrono::Utc;
    use common::ProductName;
    use rust_decimal_macros::dec;

    fn row(owner: OwnerId, version: Version) -> StockRow {
        let now = Utc::now();
        StockRow {
            owner,
            product_name: ProductName::parse("Nail").unwrap(),
            supplier_company: UNKNOWN_SUPPLIER.to_string(),
            quantity: dec!(3),
            unit_price: dec!(2),
            total_value: dec!(6),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            last_updated: now,
            created_at: now,
            price_history: vec![],
            version,
        }
    }

    #[test]
    fn empty_unit_is_rejected() {
        let err = validate_unit_of_work(&UnitOfWork::new()).unwrap_err();
        assert!(err.message.contains("empty"));
    }

    #[test]
    fn new_row_must_be_written_at_first_version() {
        let owner = OwnerId::new();
        let ok = UnitOfWork::new().with_stock(StockWrite {
            row: row(owner, Version::first()),
            expected: ExpectedVersion::New,
        });
        assert!(validate_unit_of_work(&ok).is_ok());

        let stale = UnitOfWork::new().with_stock(StockWrite {
            row: row(owner, Version::new(3)),
            expected: ExpectedVersion::New,
        });
        assert!(validate_unit_of_work(&stale).is_err());
    }

    #[test]
    fn existing_row_must_advance_by_one() {
        let unit = UnitOfWork::new().with_stock(StockWrite {
            row: row(OwnerId::new(), Version::new(5)),
            expected: ExpectedVersion::Exact(Version::new(4)),
        });
        assert!(validate_unit_of_work(&unit).is_ok());
    }

    #[test]
    fn duplicate_stock_keys_are_rejected() {
        let owner = OwnerId::new();
        let write = StockWrite {
            row: row(owner, Version::first()),
            expected: ExpectedVersion::New,
        };
        let unit = UnitOfWork::new().with_stock_writes([write.clone(), write]);
        let err = validate_unit_of_work(&unit).unwrap_err();
        assert!(err.message.contains("written twice"));
    }

    #[test]
    fn rows_breaking_invariants_are_rejected() {
        let mut broken = row(OwnerId::new(), Version::first());
        broken.total_value = dec!(7);
        let unit = UnitOfWork::new().with_stock(StockWrite {
            row: broken,
            expected: ExpectedVersion::New,
        });
        assert!(validate_unit_of_work(&unit).is_err());
    }

    #[test]
    fn validation_error_maps_to_store_error() {
        let err: crate::StoreError = invalid("boom").into();
        assert!(matches!(err, crate::StoreError::InvalidUnitOfWork(ref m) if m == "boom"));
        assert!(!err.is_conflict());
    }
}
