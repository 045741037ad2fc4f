//! Fill planning shared by Dutch auctions and fusion orders.
//!
//! A fill is computed in two steps. Planning reads the order and returns a
//! [`FillPlan`] without touching anything; the ledger then moves the funds
//! in one atomic batch and only after that commits the plan to the order.
//! A plan made against stale state fails to commit.

use std::collections::BTreeSet;

use crosslock_types::{
    AccountId, FillWatermark, Hashlock, Result, SegmentIndex, SegmentRange, SwapError,
    range_share,
};
use serde::{Deserialize, Serialize};

/// What a fill will do, computed before any funds move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillPlan {
    /// Segments claimed, or `None` for a single-secret full fill.
    pub segments: Option<SegmentRange>,
    /// Asset moved into the new escrow.
    pub amount: u64,
    /// Safety deposit moved into the new escrow.
    pub safety_deposit: u64,
    /// Leaf the escrow's hashlock verifies against.
    pub secret_index: SegmentIndex,
    /// This fill takes the last segment; the order is deleted afterwards.
    pub completes: bool,
    /// Asset left in the order after this fill.
    pub residual_amount: u64,
    /// Safety deposit left in the order after this fill.
    pub residual_deposit: u64,
}

/// Reject takers not on the whitelist.
pub(crate) fn check_resolver(whitelist: &BTreeSet<AccountId>, taker: AccountId) -> Result<()> {
    if whitelist.contains(&taker) {
        Ok(())
    } else {
        Err(SwapError::InvalidResolver { resolver: taker })
    }
}

/// Reject cancellation of an order that has already been partially taken.
pub(crate) fn check_untaken(watermark: FillWatermark) -> Result<()> {
    match watermark.get() {
        None => Ok(()),
        Some(w) => Err(SwapError::SegmentAlreadyFilled {
            requested: 0,
            watermark: Some(w),
        }),
    }
}

/// Validate the fill shape against the hashlock and split off the claimed
/// share of `price` and `safety_deposit`.
///
/// `remaining_amount` and `remaining_deposit` are what the order still
/// holds; shares are clamped to them so rounding can never overdraw.
pub(crate) fn plan_segments(
    hashlock: &Hashlock,
    watermark: FillWatermark,
    upto_segment: Option<SegmentIndex>,
    price: u64,
    safety_deposit: u64,
    remaining_amount: u64,
    remaining_deposit: u64,
) -> Result<FillPlan> {
    let (segments, amount, deposit, secret_index, completes) = match (hashlock, upto_segment) {
        (Hashlock::Single { .. }, None) => (None, price, safety_deposit, 0, true),
        (Hashlock::Single { .. }, Some(_)) => {
            return Err(SwapError::InvalidFillType {
                reason: "segment index supplied for a single-secret order".into(),
            });
        }
        (Hashlock::Merkle { .. }, None) => {
            return Err(SwapError::InvalidFillType {
                reason: "segment index required for a partially fillable order".into(),
            });
        }
        (Hashlock::Merkle { .. }, Some(upto)) => {
            let n = hashlock.segment_count();
            let range = watermark.claim(upto, n)?;
            let completes = range.last + 1 == n;
            // The completing fill reveals the extra leaf at index N.
            let secret_index = if completes { n } else { range.last };
            (
                Some(range),
                range_share(price, n, range),
                range_share(safety_deposit, n, range),
                secret_index,
                completes,
            )
        }
    };

    let amount = amount.min(remaining_amount);
    let deposit = deposit.min(remaining_deposit);
    Ok(FillPlan {
        segments,
        amount,
        safety_deposit: deposit,
        secret_index,
        completes,
        residual_amount: remaining_amount - amount,
        residual_deposit: remaining_deposit - deposit,
    })
}
