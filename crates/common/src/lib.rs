//! Shared types for the stock ledger workspace.
//!
//! Every crate in the workspace keys its data by an [`OwnerId`] and, for
//! stock rows, by a [`ProductName`]. Time is read through a [`Clock`] so the
//! retention rules can be exercised without waiting for real days to pass.

pub mod clock;
pub mod ids;
pub mod product;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{EntryId, OwnerId};
pub use product::{InvalidProductName, MAX_PRODUCT_NAME_LEN, ProductName};
