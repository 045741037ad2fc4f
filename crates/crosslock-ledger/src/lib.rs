//! # crosslock-ledger
//!
//! The opaque asset store the swap engine runs against.
//!
//! ## Architecture
//!
//! 1. **AssetStore**: balances per (holder, asset), where a holder is an
//!    account or a swap object; atomic transfer batches
//! 2. **SupplyConservation**: boundary bookkeeping that proves fund movement
//!    inside the system never creates or destroys value
//!
//! ```text
//! deposit ─▶ account ─▶ auction / fusion order ─▶ escrow ─▶ account ─▶ burn
//! ```

pub mod asset_store;
pub mod supply_conservation;

pub use asset_store::{AssetStore, Transfer};
pub use supply_conservation::SupplyConservation;
