//! Inventory commands.
//!
//! Commands carry raw caller input. The service validates them before any
//! stock row is read.

use chrono::{NaiveDate, NaiveTime};
use common::ProductName;
use ledger_store::{CustomerInfo, SupplierInfo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// Command to record a purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePurchase {
    pub supplier: SupplierInfo,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Defaults to the current date.
    pub date: Option<NaiveDate>,
    /// Defaults to the current time.
    pub time: Option<NaiveTime>,
    pub notes: Option<String>,
}

impl CreatePurchase {
    /// Creates a new CreatePurchase command dated now.
    pub fn new(
        supplier: SupplierInfo,
        product_name: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            supplier,
            product_name: product_name.into(),
            quantity,
            unit_price,
            date: None,
            time: None,
            notes: None,
        }
    }

    /// Sets the date and time the purchase happened.
    pub fn at(mut self, date: NaiveDate, time: NaiveTime) -> Self {
        self.date = Some(date);
        self.time = Some(time);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Command to edit a purchase. Unset fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePurchase {
    pub supplier: Option<SupplierInfo>,
    pub product_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub notes: Option<String>,
}

impl UpdatePurchase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supplier(mut self, supplier: SupplierInfo) -> Self {
        self.supplier = Some(supplier);
        self
    }

    pub fn product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Command to record a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSale {
    pub customer: CustomerInfo,
    pub product_name: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    /// Owner address handed to the sale notifier, if the caller knows it.
    pub notify_email: Option<String>,
}

impl CreateSale {
    /// Creates a new CreateSale command dated now.
    pub fn new(
        customer: CustomerInfo,
        product_name: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            customer,
            product_name: product_name.into(),
            quantity,
            price,
            date: None,
            time: None,
            notify_email: None,
        }
    }

    /// Sets the date and time the sale happened.
    pub fn at(mut self, date: NaiveDate, time: NaiveTime) -> Self {
        self.date = Some(date);
        self.time = Some(time);
        self
    }

    pub fn notify(mut self, email: impl Into<String>) -> Self {
        self.notify_email = Some(email.into());
        self
    }
}

/// Command to edit a sale. Unset fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSale {
    pub customer: Option<CustomerInfo>,
    pub product_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl UpdateSale {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(mut self, customer: CustomerInfo) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }
}

pub(crate) fn parse_product_name(raw: &str) -> Result<ProductName> {
    Ok(ProductName::parse(raw)?)
}

pub(crate) fn require_positive(field: &str, value: Decimal) -> Result<Decimal> {
    if value <= Decimal::ZERO {
        return Err(InventoryError::Validation(format!(
            "{field} must be greater than zero, got {value}"
        )));
    }
    Ok(value)
}

/// Multiplies quantity by price, rejecting totals outside the decimal range.
pub(crate) fn line_total(quantity: Decimal, price: Decimal) -> Result<Decimal> {
    quantity.checked_mul(price).ok_or_else(|| {
        InventoryError::Validation(format!("total of {quantity} x {price} is out of range"))
    })
}

pub(crate) fn require_present(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InventoryError::Validation(format!("{field} is required")));
    }
    Ok(())
}
