//! Stock rows: the derived per-product aggregate.

use chrono::{DateTime, Utc};
use common::{EntryId, OwnerId, ProductName};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Version;

/// Supplier company recorded when a purchase names none.
pub const UNKNOWN_SUPPLIER: &str = "N/A";

/// Quantity at or below which a product counts as running low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: Decimal = Decimal::TEN;

/// What caused a price history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceChangeKind {
    Purchase,
    Sale,
    Adjustment,
}

impl PriceChangeKind {
    /// Returns the kind as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceChangeKind::Purchase => "purchase",
            PriceChangeKind::Sale => "sale",
            PriceChangeKind::Adjustment => "adjustment",
        }
    }

    /// Parses a stored kind.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "purchase" => Some(PriceChangeKind::Purchase),
            "sale" => Some(PriceChangeKind::Sale),
            "adjustment" => Some(PriceChangeKind::Adjustment),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriceChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a stock row's append-only price log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    /// Position in the log, dense from 0.
    pub seq: u32,
    pub date: DateTime<Utc>,
    pub price: Decimal,
    #[serde(rename = "type")]
    pub kind: PriceChangeKind,
    pub reference_id: Option<EntryId>,
}

/// Key of a stock row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StockKey {
    pub owner: OwnerId,
    pub product_name: ProductName,
}

impl StockKey {
    pub fn new(owner: OwnerId, product_name: ProductName) -> Self {
        Self {
            owner,
            product_name,
        }
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stock {}/{}", self.owner, self.product_name)
    }
}

/// Current state of one product for one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub owner: OwnerId,
    pub product_name: ProductName,
    pub supplier_company: String,
    pub quantity: Decimal,
    /// Weighted average cost per unit.
    pub unit_price: Decimal,
    /// Always `quantity * unit_price`.
    pub total_value: Decimal,
    pub low_stock_threshold: Decimal,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub price_history: Vec<PriceHistoryEntry>,
    pub version: Version,
}

impl StockRow {
    /// Returns the key this row is stored under.
    pub fn key(&self) -> StockKey {
        StockKey::new(self.owner, self.product_name.clone())
    }

    /// Returns true when the quantity has fallen to the low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }

    /// Sequence number the next price history entry must use.
    pub fn next_history_seq(&self) -> u32 {
        self.price_history.len() as u32
    }

    /// Checks the row-level invariants every stored row must satisfy.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.quantity < Decimal::ZERO {
            return Err(format!(
                "{} has negative quantity {}",
                self.key(),
                self.quantity
            ));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(format!(
                "{} has negative unit price {}",
                self.key(),
                self.unit_price
            ));
        }
        if self.quantity.checked_mul(self.unit_price) != Some(self.total_value) {
            return Err(format!(
                "{} total value {} does not equal {} x {}",
                self.key(),
                self.total_value,
                self.quantity,
                self.unit_price
            ));
        }
        for (position, entry) in self.price_history.iter().enumerate() {
            if entry.seq as usize != position {
                return Err(format!(
                    "{} price history is not dense at position {position}",
                    self.key()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(quantity: Decimal, unit_price: Decimal, total_value: Decimal) -> StockRow {
        let now = Utc::now();
        StockRow {
            owner: OwnerId::new(),
            product_name: ProductName::parse("Saw").unwrap(),
            supplier_company: UNKNOWN_SUPPLIER.to_string(),
            quantity,
            unit_price,
            total_value,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            last_updated: now,
            created_at: now,
            price_history: vec![],
            version: Version::first(),
        }
    }

    #[test]
    fn consistent_row_passes() {
        assert!(row(dec!(15), dec!(5.70), dec!(85.50)).check_invariants().is_ok());
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = row(dec!(-1), dec!(2), dec!(-2)).check_invariants().unwrap_err();
        assert!(err.contains("negative quantity"));
    }

    #[test]
    fn drifted_total_is_rejected() {
        assert!(row(dec!(2), dec!(3), dec!(7)).check_invariants().is_err());
    }

    #[test]
    fn sparse_history_is_rejected() {
        let mut row = row(dec!(1), dec!(1), dec!(1));
        row.price_history.push(PriceHistoryEntry {
            seq: 1,
            date: Utc::now(),
            price: dec!(1),
            kind: PriceChangeKind::Purchase,
            reference_id: None,
        });
        assert!(row.check_invariants().is_err());
    }

    #[test]
    fn low_stock_threshold_is_inclusive() {
        assert!(row(dec!(10), dec!(1), dec!(10)).is_low_stock());
        assert!(!row(dec!(11), dec!(1), dec!(11)).is_low_stock());
    }

    #[test]
    fn price_change_kind_round_trips_through_storage_names() {
        for kind in [
            PriceChangeKind::Purchase,
            PriceChangeKind::Sale,
            PriceChangeKind::Adjustment,
        ] {
            assert_eq!(PriceChangeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(PriceChangeKind::parse("refund"), None);
    }
}
