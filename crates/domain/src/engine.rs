//! Weighted-average stock engine.
//!
//! Each function takes the current stock row (if any) and returns the row
//! that results from one ledger effect. The functions are pure: they never
//! touch storage and leave the row version alone, so the caller decides
//! which version the row is written at.

use chrono::{DateTime, Utc};
use common::{EntryId, OwnerId, ProductName};
use ledger_store::{
    PriceChangeKind, PriceHistoryEntry, PurchaseEntry, SaleEntry, StockRow, Version,
    stock::{DEFAULT_LOW_STOCK_THRESHOLD, UNKNOWN_SUPPLIER},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::StockError;

/// Factor applied to the unit price on every sale (a 5% markdown).
pub const SALE_MARKDOWN: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

/// Decimal places kept on a computed unit price.
pub const UNIT_PRICE_SCALE: u32 = 8;

/// A direct override of one product's stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_name: ProductName,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub supplier_company: Option<String>,
    pub low_stock_threshold: Option<Decimal>,
}

fn require_positive_quantity(quantity: Decimal) -> Result<(), StockError> {
    if quantity <= Decimal::ZERO {
        return Err(StockError::InvalidQuantity(quantity));
    }
    Ok(())
}

fn require_positive_price(price: Decimal) -> Result<(), StockError> {
    if price <= Decimal::ZERO {
        return Err(StockError::InvalidPrice(price));
    }
    Ok(())
}

fn unit_price_of(total: Decimal, quantity: Decimal) -> Option<Decimal> {
    if quantity > Decimal::ZERO {
        let unit_price = total.checked_div(quantity)?;
        Some(unit_price.round_dp(UNIT_PRICE_SCALE).max(Decimal::ZERO))
    } else {
        Some(Decimal::ZERO)
    }
}

fn non_blank_company(company: Option<&str>) -> Option<String> {
    company
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn overflow(product_name: &ProductName) -> StockError {
    StockError::Overflow(product_name.clone())
}

/// Sets quantity and price, deriving the total from them.
fn set_position(
    row: &mut StockRow,
    quantity: Decimal,
    unit_price: Decimal,
    at: DateTime<Utc>,
) -> Result<(), StockError> {
    row.total_value = quantity
        .checked_mul(unit_price)
        .ok_or_else(|| overflow(&row.product_name))?;
    row.quantity = quantity;
    row.unit_price = unit_price;
    row.last_updated = at;
    Ok(())
}

fn push_history(
    row: &mut StockRow,
    price: Decimal,
    kind: PriceChangeKind,
    reference_id: Option<EntryId>,
    at: DateTime<Utc>,
) {
    let seq = row.next_history_seq();
    row.price_history.push(PriceHistoryEntry {
        seq,
        date: at,
        price,
        kind,
        reference_id,
    });
}

fn empty_row(owner: OwnerId, product_name: &ProductName, at: DateTime<Utc>) -> StockRow {
    StockRow {
        owner,
        product_name: product_name.clone(),
        supplier_company: UNKNOWN_SUPPLIER.to_string(),
        quantity: Decimal::ZERO,
        unit_price: Decimal::ZERO,
        total_value: Decimal::ZERO,
        low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        last_updated: at,
        created_at: at,
        price_history: Vec::new(),
        version: Version::initial(),
    }
}

/// Adds a purchase to the stock, re-averaging the unit cost.
pub fn apply_purchase(
    current: Option<&StockRow>,
    purchase: &PurchaseEntry,
    at: DateTime<Utc>,
) -> Result<StockRow, StockError> {
    require_positive_quantity(purchase.quantity)?;
    require_positive_price(purchase.unit_price)?;

    let mut row = match current {
        Some(row) => row.clone(),
        None => empty_row(purchase.owner, &purchase.product_name, at),
    };

    let product_name = &purchase.product_name;
    let quantity = row
        .quantity
        .checked_add(purchase.quantity)
        .ok_or_else(|| overflow(product_name))?;
    let total = purchase
        .total_cost()
        .and_then(|cost| row.total_value.checked_add(cost))
        .ok_or_else(|| overflow(product_name))?;
    let unit_price = unit_price_of(total, quantity).ok_or_else(|| overflow(product_name))?;
    set_position(&mut row, quantity, unit_price, at)?;

    if let Some(company) = non_blank_company(purchase.supplier.company.as_deref()) {
        row.supplier_company = company;
    }
    push_history(
        &mut row,
        purchase.unit_price,
        PriceChangeKind::Purchase,
        Some(purchase.id),
        at,
    );
    Ok(row)
}

/// Removes sold quantity from the stock and marks the unit price down.
pub fn apply_sale(
    current: Option<&StockRow>,
    sale: &SaleEntry,
    at: DateTime<Utc>,
) -> Result<StockRow, StockError> {
    require_positive_quantity(sale.quantity)?;
    require_positive_price(sale.price)?;

    let current = current.ok_or_else(|| StockError::StockNotFound(sale.product_name.clone()))?;
    if current.quantity < sale.quantity {
        return Err(StockError::InsufficientStock {
            product_name: sale.product_name.clone(),
            requested: sale.quantity,
            available: current.quantity,
        });
    }

    let mut row = current.clone();
    let unit_price = (row.unit_price * SALE_MARKDOWN)
        .round_dp(UNIT_PRICE_SCALE)
        .max(Decimal::ZERO);
    let quantity = row.quantity - sale.quantity;
    set_position(&mut row, quantity, unit_price, at)?;
    push_history(&mut row, unit_price, PriceChangeKind::Sale, Some(sale.id), at);
    Ok(row)
}

/// Takes a purchase back out of the stock.
///
/// Quantity is floored at zero. The unit price is re-derived from the
/// remaining cost basis and is zero when nothing is left.
pub fn reverse_purchase(
    current: Option<&StockRow>,
    purchase: &PurchaseEntry,
    at: DateTime<Utc>,
) -> Result<StockRow, StockError> {
    let current =
        current.ok_or_else(|| StockError::StockNotFound(purchase.product_name.clone()))?;

    let mut row = current.clone();
    let product_name = &purchase.product_name;
    let quantity = row
        .quantity
        .checked_sub(purchase.quantity)
        .ok_or_else(|| overflow(product_name))?
        .max(Decimal::ZERO);
    let total = purchase
        .total_cost()
        .and_then(|cost| row.total_value.checked_sub(cost))
        .ok_or_else(|| overflow(product_name))?;
    let unit_price = unit_price_of(total, quantity).ok_or_else(|| overflow(product_name))?;
    set_position(&mut row, quantity, unit_price, at)?;
    push_history(
        &mut row,
        unit_price,
        PriceChangeKind::Adjustment,
        Some(purchase.id),
        at,
    );
    Ok(row)
}

/// Puts sold quantity back at the current unit price.
///
/// The markdown applied by the sale stays in place.
pub fn reverse_sale(
    current: Option<&StockRow>,
    sale: &SaleEntry,
    at: DateTime<Utc>,
) -> Result<StockRow, StockError> {
    let current = current.ok_or_else(|| StockError::StockNotFound(sale.product_name.clone()))?;

    let mut row = current.clone();
    let unit_price = row.unit_price;
    let quantity = row
        .quantity
        .checked_add(sale.quantity)
        .ok_or_else(|| overflow(&sale.product_name))?;
    set_position(&mut row, quantity, unit_price, at)?;
    push_history(
        &mut row,
        unit_price,
        PriceChangeKind::Adjustment,
        Some(sale.id),
        at,
    );
    Ok(row)
}

/// Overrides a product's stock level, creating the row if needed.
pub fn set_level(
    current: Option<&StockRow>,
    owner: OwnerId,
    level: &StockLevel,
    at: DateTime<Utc>,
) -> Result<StockRow, StockError> {
    if level.quantity < Decimal::ZERO {
        return Err(StockError::InvalidQuantity(level.quantity));
    }
    if level.unit_price < Decimal::ZERO {
        return Err(StockError::InvalidPrice(level.unit_price));
    }

    let mut row = match current {
        Some(row) => row.clone(),
        None => empty_row(owner, &level.product_name, at),
    };

    set_position(&mut row, level.quantity, level.unit_price, at)?;
    if let Some(company) = non_blank_company(level.supplier_company.as_deref()) {
        row.supplier_company = company;
    }
    if let Some(threshold) = level.low_stock_threshold {
        row.low_stock_threshold = threshold.max(Decimal::ZERO);
    }
    push_history(&mut row, level.unit_price, PriceChangeKind::Adjustment, None, at);
    Ok(row)
}
