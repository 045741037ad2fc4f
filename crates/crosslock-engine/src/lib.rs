//! # crosslock-engine
//!
//! Hashed-timelock cross-chain swaps: makers post Dutch auctions
//! (destination side) or fusion orders (source side), whitelisted resolvers
//! fill them into escrows, and escrows settle by secret reveal or time out
//! into recovery.
//!
//! ## Architecture
//!
//! 1. **DutchAuction** / **FusionOrder**: maker-funded holding objects with
//!    a fill watermark over N segments
//! 2. **Escrow**: dual-party custody with a five-phase timelock and a single
//!    or Merkle hashlock
//! 3. **SwapLedger**: registry and dispatch; each call is one atomic
//!    mutation over the asset store
//! 4. **SharedLedger**: lock-serialized handle for concurrent callers
//!
//! ```text
//! create ─▶ [Auction|FusionOrder] ─fill─▶ [Escrow] ─withdraw/recovery─▶ accounts
//! ```

pub mod auction;
pub mod escrow;
pub mod fill;
pub mod fusion_order;
pub mod ledger;
pub mod shared;

pub use auction::{AuctionParams, DutchAuction};
pub use escrow::{Escrow, Resolution};
pub use fill::FillPlan;
pub use fusion_order::{CancelPayout, FusionOrder, FusionOrderParams};
pub use ledger::SwapLedger;
pub use shared::SharedLedger;
