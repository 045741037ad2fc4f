//! Error types for the crosslock swap engine.
//!
//! Every error renders with its `E`-prefixed code first so that rejected
//! calls are easy to grep for in logs. Codes are grouped by family:
//! - parameter validation
//! - authorization
//! - temporal / phase
//! - state consistency
//! - cryptographic
//! - ledger
//! - general / ambient

use thiserror::Error;

use crate::{AccountId, Holder, Phase, SegmentIndex, Timestamp};

/// Central error enum for all crosslock operations.
///
/// A call that returns any of these has had no effect: balances,
/// watermarks and object registries are exactly as they were before it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    // =================================================================
    // Parameter validation
    // =================================================================
    /// Zero amounts, inverted time window, or an ending price above the
    /// starting price.
    #[error("EINVALID_AUCTION_PARAMS: Invalid auction parameters: {reason}")]
    InvalidAuctionParams { reason: String },

    /// Zero amount or zero safety deposit on a fusion order.
    #[error("EINVALID_ORDER_PARAMS: Invalid fusion order parameters: {reason}")]
    InvalidOrderParams { reason: String },

    /// The hash set is empty or cannot form a commitment.
    #[error("EINVALID_HASHES: Invalid hash set: {reason}")]
    InvalidHashes { reason: String },

    /// The resolver whitelist is empty.
    #[error("EINVALID_RESOLVER_WHITELIST: Resolver whitelist must not be empty")]
    InvalidResolverWhitelist,

    // =================================================================
    // Authorization
    // =================================================================
    /// The caller is not allowed to perform this operation now.
    #[error("EINVALID_CALLER: Caller {caller} is not authorized")]
    InvalidCaller { caller: AccountId },

    /// The taker is not on the order's resolver whitelist.
    #[error("EINVALID_RESOLVER: Resolver {resolver} is not whitelisted")]
    InvalidResolver { resolver: AccountId },

    // =================================================================
    // Temporal / phase
    // =================================================================
    /// The escrow's timelock is in a phase that does not permit this call.
    #[error("EINVALID_PHASE: Operation not permitted during {phase}")]
    InvalidPhase { phase: Phase },

    /// Fill attempted before the auction start time.
    #[error("EAUCTION_NOT_STARTED: Auction starts at {start_time}, now is {now}")]
    AuctionNotStarted { now: Timestamp, start_time: Timestamp },

    /// Fill attempted at or after the auction end time.
    #[error("EAUCTION_ENDED: Auction ended at {end_time}, now is {now}")]
    AuctionEnded { now: Timestamp, end_time: Timestamp },

    // =================================================================
    // State consistency
    // =================================================================
    /// The requested segment is at or below the current fill watermark,
    /// or the order has fills that forbid the operation.
    #[error(
        "ESEGMENT_ALREADY_FILLED: Segment {requested} already filled (watermark {})",
        display_watermark(.watermark)
    )]
    SegmentAlreadyFilled {
        requested: SegmentIndex,
        /// `None` when nothing has been filled yet.
        watermark: Option<SegmentIndex>,
    },

    /// The requested segment is outside the order's segment range.
    #[error("EINVALID_SEGMENT: Segment {requested} out of range (order has {segment_count} segments)")]
    InvalidSegment {
        requested: SegmentIndex,
        segment_count: SegmentIndex,
    },

    /// A segment index was supplied for a single-secret order, or omitted
    /// for a multi-secret one.
    #[error("EINVALID_FILL_TYPE: {reason}")]
    InvalidFillType { reason: String },

    /// The addressed auction, order or escrow does not exist (never
    /// created, or already resolved and deleted).
    #[error("EOBJECT_DOES_NOT_EXIST: {0} does not exist")]
    ObjectDoesNotExist(String),

    // =================================================================
    // Cryptographic
    // =================================================================
    /// The revealed secret does not verify against the escrow's hashlock.
    #[error("EINVALID_SECRET: Secret does not match hashlock")]
    InvalidSecret,

    // =================================================================
    // Ledger
    // =================================================================
    /// The holder does not have enough of the asset.
    #[error("EINSUFFICIENT_BALANCE: {holder} needs {needed} {asset}, has {available}")]
    InsufficientBalance {
        holder: Holder,
        asset: String,
        needed: u64,
        available: u64,
    },

    /// An amount computation or credit would exceed `u64::MAX`.
    #[error("EAMOUNT_OVERFLOW: Amount overflow in {context}")]
    AmountOverflow { context: &'static str },

    /// Supply conservation invariant violated.
    #[error("ESUPPLY_INVARIANT: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / ambient
    // =================================================================
    /// Invalid engine configuration.
    #[error("ECONFIGURATION: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("ESERIALIZATION: Serialization error: {0}")]
    Serialization(String),
}

impl SwapError {
    /// The stable error code, e.g. `"EINVALID_PHASE"`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAuctionParams { .. } => "EINVALID_AUCTION_PARAMS",
            Self::InvalidOrderParams { .. } => "EINVALID_ORDER_PARAMS",
            Self::InvalidHashes { .. } => "EINVALID_HASHES",
            Self::InvalidResolverWhitelist => "EINVALID_RESOLVER_WHITELIST",
            Self::InvalidCaller { .. } => "EINVALID_CALLER",
            Self::InvalidResolver { .. } => "EINVALID_RESOLVER",
            Self::InvalidPhase { .. } => "EINVALID_PHASE",
            Self::AuctionNotStarted { .. } => "EAUCTION_NOT_STARTED",
            Self::AuctionEnded { .. } => "EAUCTION_ENDED",
            Self::SegmentAlreadyFilled { .. } => "ESEGMENT_ALREADY_FILLED",
            Self::InvalidSegment { .. } => "EINVALID_SEGMENT",
            Self::InvalidFillType { .. } => "EINVALID_FILL_TYPE",
            Self::ObjectDoesNotExist(_) => "EOBJECT_DOES_NOT_EXIST",
            Self::InvalidSecret => "EINVALID_SECRET",
            Self::InsufficientBalance { .. } => "EINSUFFICIENT_BALANCE",
            Self::AmountOverflow { .. } => "EAMOUNT_OVERFLOW",
            Self::SupplyInvariantViolation { .. } => "ESUPPLY_INVARIANT",
            Self::Configuration(_) => "ECONFIGURATION",
            Self::Serialization(_) => "ESERIALIZATION",
        }
    }
}

/// Crate-wide `Result` alias.
#[allow(clippy::ref_option)]
fn display_watermark(watermark: &Option<SegmentIndex>) -> String {
    watermark.map_or_else(|| "none".to_string(), |w| w.to_string())
}

pub type Result<T> = std::result::Result<T, SwapError>;

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
