//! # Fusion order
//!
//! A maker-funded order on the source chain. The maker locks the asset and
//! the safety deposit up front; whitelisted resolvers fill it at a fixed
//! amount, in whole or by segments, into source-side escrows.
//!
//! Until a resolver takes it, the maker can cancel the order. It may also
//! carry a stale timestamp; once that passes, anyone can cancel an untaken
//! order and collect the safety deposit for doing so, while the asset goes
//! back to the maker.

use std::collections::BTreeSet;

use crosslock_types::{
    AccountId, Asset, FillWatermark, FusionOrderId, HashDigest, Hashlock, OrderHash, Result,
    SegmentIndex, SwapError, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::fill::{FillPlan, check_resolver, check_untaken, plan_segments};

/// Caller-supplied parameters for a new fusion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionOrderParams {
    pub order_hash: OrderHash,
    pub hashes: Vec<HashDigest>,
    pub asset: Asset,
    pub amount: u64,
    pub safety_deposit: u64,
    pub resolver_whitelist: Vec<AccountId>,
    #[serde(default)]
    pub stale_timestamp: Option<Timestamp>,
}

/// Who a cancellation pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelPayout {
    /// Always the maker.
    pub asset_to: AccountId,
    /// The maker, or the third party that cancelled a stale order.
    pub deposit_to: AccountId,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionOrder {
    id: FusionOrderId,
    maker: AccountId,
    order_hash: OrderHash,
    hashlock: Hashlock,
    asset: Asset,
    amount: u64,
    safety_deposit: u64,
    resolver_whitelist: BTreeSet<AccountId>,
    fill_watermark: FillWatermark,
    stale_timestamp: Option<Timestamp>,
    remaining_amount: u64,
    remaining_deposit: u64,
}

impl FusionOrder {
    /// Validate `params` and build the record.
    ///
    /// # Errors
    /// `EINVALID_ORDER_PARAMS`, `EINVALID_HASHES`, `EINVALID_RESOLVER_WHITELIST`.
    pub fn new(
        id: FusionOrderId,
        maker: AccountId,
        params: FusionOrderParams,
        max_segments: u32,
    ) -> Result<Self> {
        if params.amount == 0 {
            return Err(SwapError::InvalidOrderParams {
                reason: "amount must be positive".into(),
            });
        }
        if params.safety_deposit == 0 {
            return Err(SwapError::InvalidOrderParams {
                reason: "safety_deposit must be positive".into(),
            });
        }

        let hashlock = Hashlock::from_hashes(&params.hashes)?;
        if hashlock.segment_count() > max_segments {
            return Err(SwapError::InvalidHashes {
                reason: format!(
                    "{} segments exceeds the limit of {max_segments}",
                    hashlock.segment_count()
                ),
            });
        }

        let resolver_whitelist: BTreeSet<AccountId> =
            params.resolver_whitelist.into_iter().collect();
        if resolver_whitelist.is_empty() {
            return Err(SwapError::InvalidResolverWhitelist);
        }

        Ok(Self {
            id,
            maker,
            order_hash: params.order_hash,
            hashlock,
            asset: params.asset,
            amount: params.amount,
            safety_deposit: params.safety_deposit,
            resolver_whitelist,
            fill_watermark: FillWatermark::new(),
            stale_timestamp: params.stale_timestamp,
            remaining_amount: params.amount,
            remaining_deposit: params.safety_deposit,
        })
    }

    /// Check a fill by `taker` and compute what it would move.
    ///
    /// # Errors
    /// In order: `EINVALID_RESOLVER`, `EINVALID_FILL_TYPE`,
    /// `EINVALID_SEGMENT`, `ESEGMENT_ALREADY_FILLED`.
    pub fn plan_fill(
        &self,
        taker: AccountId,
        upto_segment: Option<SegmentIndex>,
    ) -> Result<FillPlan> {
        check_resolver(&self.resolver_whitelist, taker)?;
        plan_segments(
            &self.hashlock,
            self.fill_watermark,
            upto_segment,
            self.amount,
            self.safety_deposit,
            self.remaining_amount,
            self.remaining_deposit,
        )
    }

    /// Record a fill whose funds have already moved.
    ///
    /// # Errors
    /// `ESEGMENT_ALREADY_FILLED` if another fill committed first.
    pub fn commit_fill(&mut self, plan: &FillPlan) -> Result<()> {
        if let Some(range) = plan.segments {
            self.fill_watermark.advance(range)?;
        }
        self.remaining_amount = plan.residual_amount;
        self.remaining_deposit = plan.residual_deposit;
        Ok(())
    }

    /// Decide whether `caller` may cancel at `now`, and who gets paid.
    /// Only an order nobody has taken yet can be cancelled.
    ///
    /// # Errors
    /// `EINVALID_CALLER` if the caller is not the maker and the order is
    /// not stale, `ESEGMENT_ALREADY_FILLED` once any segment is taken.
    pub fn authorize_cancel(&self, caller: AccountId, now: Timestamp) -> Result<CancelPayout> {
        let payout = if caller == self.maker {
            CancelPayout {
                asset_to: self.maker,
                deposit_to: self.maker,
                stale: false,
            }
        } else if self.is_stale(now) {
            CancelPayout {
                asset_to: self.maker,
                deposit_to: caller,
                stale: true,
            }
        } else {
            return Err(SwapError::InvalidCaller { caller });
        };
        check_untaken(self.fill_watermark)?;
        Ok(payout)
    }

    /// Whether a stale timestamp is set and `now` has reached it.
    #[must_use]
    pub fn is_stale(&self, now: Timestamp) -> bool {
        self.stale_timestamp.is_some_and(|t| now >= t)
    }

    #[must_use]
    pub fn remaining_segments(&self) -> u32 {
        self.fill_watermark
            .remaining(self.hashlock.segment_count())
    }

    #[must_use]
    pub fn id(&self) -> FusionOrderId {
        self.id
    }

    #[must_use]
    pub fn maker(&self) -> AccountId {
        self.maker
    }

    #[must_use]
    pub fn order_hash(&self) -> OrderHash {
        self.order_hash
    }

    #[must_use]
    pub fn hashlock(&self) -> &Hashlock {
        &self.hashlock
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
    pub fn stale_timestamp(&self) -> Option<Timestamp> {
        self.stale_timestamp
    }

    #[must_use]
    pub fn fill_watermark(&self) -> FillWatermark {
        self.fill_watermark
    }

    #[must_use]
    pub fn remaining_amount(&self) -> u64 {
        self.remaining_amount
    }

    #[must_use]
    pub fn remaining_deposit(&self) -> u64 {
        self.remaining_deposit
    }
}
