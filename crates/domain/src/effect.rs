//! Ledger entries as reversible stock effects.

use chrono::{DateTime, Utc};
use common::{EntryId, ProductName};
use ledger_store::{PurchaseEntry, SaleEntry};

use crate::{StockError, StockWorkset};

/// A ledger entry whose effect on stock can be applied and undone.
pub trait ReversibleEffect {
    /// Id of the entry, used as the price history reference.
    fn entry_id(&self) -> EntryId;

    /// Product whose stock row the effect touches.
    fn product_name(&self) -> &ProductName;

    /// Applies the effect to the workset.
    fn apply(&self, workset: &mut StockWorkset, at: DateTime<Utc>) -> Result<(), StockError>;

    /// Undoes the effect on the workset.
    fn reverse(&self, workset: &mut StockWorkset, at: DateTime<Utc>) -> Result<(), StockError>;
}

impl ReversibleEffect for PurchaseEntry {
    fn entry_id(&self) -> EntryId {
        self.id
    }

    fn product_name(&self) -> &ProductName {
        &self.product_name
    }

    fn apply(&self, workset: &mut StockWorkset, at: DateTime<Utc>) -> Result<(), StockError> {
        workset.apply_purchase(self, at).map(|_| ())
    }

    fn reverse(&self, workset: &mut StockWorkset, at: DateTime<Utc>) -> Result<(), StockError> {
        workset.reverse_purchase(self, at).map(|_| ())
    }
}

impl ReversibleEffect for SaleEntry {
    fn entry_id(&self) -> EntryId {
        self.id
    }

    fn product_name(&self) -> &ProductName {
        &self.product_name
    }

    fn apply(&self, workset: &mut StockWorkset, at: DateTime<Utc>) -> Result<(), StockError> {
        workset.apply_sale(self, at).map(|_| ())
    }

    fn reverse(&self, workset: &mut StockWorkset, at: DateTime<Utc>) -> Result<(), StockError> {
        workset.reverse_sale(self, at).map(|_| ())
    }
}

/// Replaces one effect with another: reverses `old`, then applies `new`.
///
/// If either step fails, every row is put back to the state it had before
/// the call and the error is returned.
pub fn replace_effect<E: ReversibleEffect>(
    workset: &mut StockWorkset,
    old: &E,
    new: &E,
    at: DateTime<Utc>,
) -> Result<(), StockError> {
    let checkpoint = workset.checkpoint();

    let result = old
        .reverse(workset, at)
        .and_then(|()| new.apply(workset, at));

    if let Err(err) = result {
        tracing::debug!(
            entry_id = %old.entry_id(),
            product = %new.product_name(),
            error = %err,
            "compensating failed effect replacement"
        );
        workset.restore(checkpoint);
        return Err(err);
    }
    Ok(())
}
