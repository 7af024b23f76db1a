//! Stock engine error types.

use common::ProductName;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the stock engine.
///
/// None of these leave a partially applied change behind: an engine
/// operation either returns the next row or fails without touching state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// Quantity was zero or negative where a positive one is required.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(Decimal),

    /// Price was zero or negative where a positive one is required.
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    /// No stock row exists for the product.
    #[error("No stock recorded for product '{0}'")]
    StockNotFound(ProductName),

    /// Quantity or value of a stock row would exceed the decimal range.
    #[error("Amount out of range for product '{0}'")]
    Overflow(ProductName),

    /// Not enough stock on hand to cover a sale.
    #[error(
        "Insufficient stock for '{product_name}': requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_name: ProductName,
        requested: Decimal,
        available: Decimal,
    },
}
