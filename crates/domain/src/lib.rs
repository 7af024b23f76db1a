//! Stock aggregate engine.
//!
//! This crate provides:
//! - Pure weighted-average functions that derive the next stock row from a
//!   purchase, a sale, their reversals or a direct level override
//! - `StockWorkset`, which stages the rows of one operation and turns them
//!   into version-checked writes
//! - `ReversibleEffect`, the apply/reverse contract shared by purchases and
//!   sales, with compensation on replacement

pub mod effect;
pub mod engine;
pub mod error;
pub mod workset;

pub use effect::{ReversibleEffect, replace_effect};
pub use engine::{SALE_MARKDOWN, StockLevel};
pub use error::StockError;
pub use workset::{StockWorkset, WorksetCheckpoint};
