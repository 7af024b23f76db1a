//! Purchase and sale ledger entries.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::{EntryId, OwnerId, ProductName};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Version;

/// Who a purchase was bought from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub name: String,
    pub location: String,
    pub company: Option<String>,
}

/// Who a sale was made to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub number: String,
}

/// A stock inflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    pub id: EntryId,
    pub owner: OwnerId,
    pub supplier: SupplierInfo,
    pub product_name: ProductName,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: Option<String>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl PurchaseEntry {
    /// Cost basis this purchase contributed to its stock row.
    ///
    /// Returns `None` if the product does not fit in a `Decimal`.
    pub fn total_cost(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    /// Returns true once the entry is soft-deleted at or before `cutoff`.
    pub fn purge_eligible(&self, cutoff: DateTime<Utc>) -> bool {
        purge_eligible(self.deleted, self.deleted_at, cutoff)
    }

    /// Returns the entry flagged as soft-deleted at `at`, one version later.
    pub fn soft_deleted(&self, at: DateTime<Utc>) -> Self {
        Self {
            deleted: true,
            deleted_at: Some(at),
            updated_at: at,
            version: self.version.next(),
            ..self.clone()
        }
    }
}

/// A stock outflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleEntry {
    pub id: EntryId,
    pub owner: OwnerId,
    pub customer: CustomerInfo,
    pub product_name: ProductName,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total_price: Decimal,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

impl SaleEntry {
    /// Returns true once the entry is soft-deleted at or before `cutoff`.
    pub fn purge_eligible(&self, cutoff: DateTime<Utc>) -> bool {
        purge_eligible(self.deleted, self.deleted_at, cutoff)
    }

    /// Returns the entry flagged as soft-deleted at `at`, one version later.
    pub fn soft_deleted(&self, at: DateTime<Utc>) -> Self {
        Self {
            deleted: true,
            deleted_at: Some(at),
            updated_at: at,
            version: self.version.next(),
            ..self.clone()
        }
    }
}

fn purge_eligible(deleted: bool, deleted_at: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    deleted && deleted_at.is_some_and(|at| at <= cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn purchase() -> PurchaseEntry {
        let now = Utc::now();
        PurchaseEntry {
            id: EntryId::new(),
            owner: OwnerId::new(),
            supplier: SupplierInfo {
                name: "Kofi".to_string(),
                location: "Accra".to_string(),
                company: None,
            },
            product_name: ProductName::parse("Hammer").unwrap(),
            quantity: dec!(4),
            unit_price: dec!(2.50),
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
    fn total_cost_is_quantity_times_price() {
        assert_eq!(purchase().total_cost(), Some(dec!(10.00)));
    }

    #[test]
    fn soft_delete_bumps_version_and_stamps_time() {
        let entry = purchase();
        let at = Utc::now();
        let deleted = entry.soft_deleted(at);

        assert!(deleted.deleted);
        assert_eq!(deleted.deleted_at, Some(at));
        assert_eq!(deleted.version, Version::new(2));
        assert_eq!(deleted.quantity, entry.quantity);
    }

    #[test]
    fn json_shape_uses_plain_names() {
        let entry = purchase();
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["product_name"], "Hammer");
        assert_eq!(json["supplier"]["location"], "Accra");
        assert_eq!(json["version"], 1);

        let back: PurchaseEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn purge_eligibility_uses_inclusive_cutoff() {
        let at = Utc::now();
        let deleted = purchase().soft_deleted(at);

        assert!(deleted.purge_eligible(at));
        assert!(deleted.purge_eligible(at + Duration::seconds(1)));
        assert!(!deleted.purge_eligible(at - Duration::seconds(1)));
        assert!(!purchase().purge_eligible(at));
    }
}
