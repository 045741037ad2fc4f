//! Swap events: the append-only audit trail of a crosslock ledger.
//!
//! Every successful mutation records exactly one [`SwapEvent`]. Rejected
//! calls record nothing.

use serde::{Deserialize, Serialize};

use crate::{
    AccountId, AuctionId, EscrowId, FusionOrderId, OrderHash, Phase, SegmentRange, Timestamp,
};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapEventKind {
    AuctionCreated {
        auction: AuctionId,
        maker: AccountId,
        order_hash: OrderHash,
        starting_amount: u64,
        safety_deposit: u64,
        segments: u32,
    },
    AuctionFilled {
        auction: AuctionId,
        escrow: EscrowId,
        taker: AccountId,
        segments: Option<SegmentRange>,
        amount: u64,
        safety_deposit: u64,
        completed: bool,
    },
    AuctionCancelled {
        auction: AuctionId,
        refunded_amount: u64,
        refunded_deposit: u64,
    },
    FusionOrderCreated {
        order: FusionOrderId,
        maker: AccountId,
        order_hash: OrderHash,
        amount: u64,
        safety_deposit: u64,
        segments: u32,
    },
    FusionOrderFilled {
        order: FusionOrderId,
        escrow: EscrowId,
        taker: AccountId,
        segments: Option<SegmentRange>,
        amount: u64,
        safety_deposit: u64,
        completed: bool,
    },
    FusionOrderCancelled {
        order: FusionOrderId,
        caller: AccountId,
        /// Cancelled by a third party after the stale timestamp.
        stale: bool,
    },
    EscrowWithdrawn {
        escrow: EscrowId,
        caller: AccountId,
        phase: Phase,
        asset_recipient: AccountId,
    },
    EscrowRecovered {
        escrow: EscrowId,
        caller: AccountId,
        phase: Phase,
        asset_recipient: AccountId,
    },
}

impl SwapEventKind {
    /// Stable upper-case name, for logs and metrics labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuctionCreated { .. } => "AUCTION_CREATED",
            Self::AuctionFilled { .. } => "AUCTION_FILLED",
            Self::AuctionCancelled { .. } => "AUCTION_CANCELLED",
            Self::FusionOrderCreated { .. } => "FUSION_ORDER_CREATED",
            Self::FusionOrderFilled { .. } => "FUSION_ORDER_FILLED",
            Self::FusionOrderCancelled { .. } => "FUSION_ORDER_CANCELLED",
            Self::EscrowWithdrawn { .. } => "ESCROW_WITHDRAWN",
            Self::EscrowRecovered { .. } => "ESCROW_RECOVERED",
        }
    }
}

/// One entry in the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    /// Ledger time of the call that produced it.
    pub at: Timestamp,
    pub kind: SwapEventKind,
}
