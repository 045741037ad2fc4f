//! # crosslock-types
//!
//! Shared types, errors, and configuration for the **crosslock** swap engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AuctionId`], [`FusionOrderId`], [`EscrowId`], [`OrderHash`]
//! - **Holders**: [`Holder`], [`Asset`]
//! - **Hashlock**: [`Hashlock`], [`MerkleTree`], [`MerkleProof`], [`Secret`]
//! - **Timelock**: [`Timelock`], [`Phase`]
//! - **Segments**: [`SegmentIndex`], [`SegmentRange`], [`FillWatermark`]
//! - **Time**: [`Timestamp`], [`Clock`], [`SystemClock`], [`FixedClock`]
//! - **Events**: [`SwapEvent`], [`SwapEventKind`]
//! - **Configuration**: [`EngineConfig`], [`TimelockConfig`]
//! - **Errors**: [`SwapError`] with `E`-prefixed codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod hashlock;
pub mod ids;
pub mod segment;
pub mod timelock;

pub use balance::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use hashlock::*;
pub use ids::*;
pub use segment::*;
pub use timelock::*;

// Constants are accessed via `crosslock_types::constants::FOO`.
