//! # Escrow
//!
//! Dual-party custody created by a fill. The escrow holds the filled asset
//! and safety deposit until one of two things happens:
//!
//! - **withdraw**: someone reveals the secret during a withdrawal phase and
//!   the asset goes to its counterparty
//! - **recovery**: nobody did, and once a cancellation phase opens the
//!   asset goes back where it came from
//!
//! Either way the safety deposit pays whoever made the call. The first
//! successful resolution deletes the escrow.
//!
//! | Escrow side  | withdraw pays asset to | recovery pays asset to |
//! |--------------|------------------------|------------------------|
//! | source       | taker                  | maker                  |
//! | destination  | maker                  | taker                  |

use crosslock_types::{
    AccountId, Asset, EscrowId, Hashlock, MerkleProof, OrderHash, Phase, Result, SegmentIndex,
    SegmentRange, SwapError, Timelock, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::fill::FillPlan;

/// Where a resolved escrow's funds go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub phase: Phase,
    pub asset_to: AccountId,
    pub deposit_to: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    id: EscrowId,
    order_hash: OrderHash,
    timelock: Timelock,
    hashlock: Hashlock,
    /// Leaf the withdrawing secret must verify against.
    secret_index: SegmentIndex,
    asset: Asset,
    amount: u64,
    safety_deposit: u64,
    maker: AccountId,
    taker: AccountId,
    /// Source-side escrows come from fusion orders, destination-side ones
    /// from Dutch auctions.
    is_source_chain: bool,
    /// Segments this escrow was filled with; `None` for a single fill.
    consumed_segments: Option<SegmentRange>,
}

impl Escrow {
    /// Build the escrow a fill described by `plan` creates.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        order_hash: OrderHash,
        timelock: Timelock,
        hashlock: Hashlock,
        asset: Asset,
        maker: AccountId,
        taker: AccountId,
        is_source_chain: bool,
        plan: &FillPlan,
    ) -> Self {
        Self {
            id: EscrowId::new(),
            order_hash,
            timelock,
            hashlock,
            secret_index: plan.secret_index,
            asset,
            amount: plan.amount,
            safety_deposit: plan.safety_deposit,
            maker,
            taker,
            is_source_chain,
            consumed_segments: plan.segments,
        }
    }

    /// Phase at `now`.
    #[must_use]
    pub fn phase(&self, now: Timestamp) -> Phase {
        self.timelock.current_phase(now)
    }

    /// Check a withdrawal: phase, then caller, then secret.
    ///
    /// # Errors
    /// `EINVALID_PHASE`, `EINVALID_CALLER` (exclusive phase, non-taker),
    /// `EINVALID_SECRET`.
    pub fn authorize_withdraw(
        &self,
        caller: AccountId,
        secret: &[u8],
        proof: Option<&MerkleProof>,
        now: Timestamp,
    ) -> Result<Resolution> {
        let phase = self.phase(now);
        if !phase.allows_withdraw() {
            return Err(SwapError::InvalidPhase { phase });
        }
        self.check_taker_only(phase, caller)?;
        if !self.hashlock.verify(secret, self.secret_index, proof) {
            return Err(SwapError::InvalidSecret);
        }
        let asset_to = if self.is_source_chain {
            self.taker
        } else {
            self.maker
        };
        Ok(Resolution {
            phase,
            asset_to,
            deposit_to: caller,
        })
    }

    /// Check a recovery: phase, then caller.
    ///
    /// # Errors
    /// `EINVALID_PHASE`, `EINVALID_CALLER` (private phase, non-taker).
    pub fn authorize_recovery(&self, caller: AccountId, now: Timestamp) -> Result<Resolution> {
        let phase = self.phase(now);
        if !phase.allows_recovery() {
            return Err(SwapError::InvalidPhase { phase });
        }
        self.check_taker_only(phase, caller)?;
        let asset_to = if self.is_source_chain {
            self.maker
        } else {
            self.taker
        };
        Ok(Resolution {
            phase,
            asset_to,
            deposit_to: caller,
        })
    }

    fn check_taker_only(&self, phase: Phase, caller: AccountId) -> Result<()> {
        if phase.is_taker_only() && caller != self.taker {
            return Err(SwapError::InvalidCaller { caller });
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> EscrowId {
        self.id
    }

    #[must_use]
    pub fn order_hash(&self) -> OrderHash {
        self.order_hash
    }

    #[must_use]
    pub fn timelock(&self) -> &Timelock {
        &self.timelock
    }

    #[must_use]
    pub fn hashlock(&self) -> &Hashlock {
        &self.hashlock
    }

    #[must_use]
    pub fn secret_index(&self) -> SegmentIndex {
        self.secret_index
    }

    #[must_use]
    pub fn asset(&self) -> &str {
        &self.asset
    }

    #[must_use]
    pub fn amount(&self) -> u64 {
        self.amount
    }

    #[must_use]
    pub fn safety_deposit(&self) -> u64 {
        self.safety_deposit
    }

    #[must_use]
    pub fn maker(&self) -> AccountId {
        self.maker
    }

    #[must_use]
    pub fn taker(&self) -> AccountId {
        self.taker
    }

    #[must_use]
    pub fn is_source_chain(&self) -> bool {
        self.is_source_chain
    }

    #[must_use]
    pub fn consumed_segments(&self) -> Option<SegmentRange> {
        self.consumed_segments
    }
}
