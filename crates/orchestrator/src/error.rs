//! Orchestrator error taxonomy.

use common::{InvalidProductName, ProductName};
use domain::StockError;
use ledger_store::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of an [`InventoryError`], stable for callers that
/// map errors onto a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientStock,
    Policy,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Returns the kind as a metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::Policy => "policy",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors returned by inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The request was malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The entry or stock row does not exist for this owner.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A sale asked for more than is on hand.
    #[error(
        "Insufficient stock for '{product_name}': requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_name: ProductName,
        requested: Decimal,
        available: Decimal,
    },

    /// The entry's lifecycle does not allow the operation.
    #[error("Operation not permitted: {0}")]
    Policy(String),

    /// Concurrent writers kept winning the race for the same rows.
    #[error("Concurrent modification, gave up after {attempts} attempts")]
    Conflict { attempts: u32 },

    /// Storage failed. The source is logged where the error is created.
    #[error("Internal error")]
    Internal(#[source] StoreError),
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::Validation(_) => ErrorKind::Validation,
            InventoryError::NotFound(_) => ErrorKind::NotFound,
            InventoryError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            InventoryError::Policy(_) => ErrorKind::Policy,
            InventoryError::Conflict { .. } => ErrorKind::Conflict,
            InventoryError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::Conflict { .. })
    }

    /// Returns true if the error is caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, InventoryError::Internal(_))
    }
}

impl From<StockError> for InventoryError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::InvalidQuantity(_)
            | StockError::InvalidPrice(_)
            | StockError::Overflow(_) => InventoryError::Validation(err.to_string()),
            StockError::StockNotFound(product_name) => {
                InventoryError::NotFound(format!("stock for product '{product_name}'"))
            }
            StockError::InsufficientStock {
                product_name,
                requested,
                available,
            } => InventoryError::InsufficientStock {
                product_name,
                requested,
                available,
            },
        }
    }
}

impl From<StoreError> for InventoryError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "ledger store failure");
        InventoryError::Internal(err)
    }
}

impl From<InvalidProductName> for InventoryError {
    fn from(err: InvalidProductName) -> Self {
        InventoryError::Validation(err.to_string())
    }
}

/// Convenience type alias for inventory results.
pub type Result<T> = std::result::Result<T, InventoryError>;
