//! # Dutch auction
//!
//! A maker-funded auction on the destination chain. The asset price decays
//! linearly from `starting_amount` to `ending_amount` over `decay_duration`
//! and whitelisted resolvers fill it, in whole or by segments, into
//! escrows.
//!
//! ```text
//! price
//!   │ starting ──╮
//!   │            ╰──╮
//!   │               ╰── ending ────────────┤
//!   └──────┬─────────────┬─────────────────┬──▶ time
//!        start    start + decay           end
//! ```

use std::collections::BTreeSet;

use crosslock_types::{
    AccountId, Asset, AuctionId, FillWatermark, HashDigest, Hashlock, OrderHash, Result,
    SegmentIndex, SwapError, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::fill::{FillPlan, check_resolver, check_untaken, plan_segments};

/// Caller-supplied parameters for a new auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionParams {
    pub order_hash: OrderHash,
    /// One digest for a single fill, N + 1 digests for N segments.
    pub hashes: Vec<HashDigest>,
    pub asset: Asset,
    pub starting_amount: u64,
    pub ending_amount: u64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub decay_duration: u64,
    /// Total safety deposit, in the native asset.
    pub safety_deposit: u64,
    pub resolver_whitelist: Vec<AccountId>,
}

/// A live auction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutchAuction {
    id: AuctionId,
    maker: AccountId,
    order_hash: OrderHash,
    hashlock: Hashlock,
    asset: Asset,
    starting_amount: u64,
    ending_amount: u64,
    start_time: Timestamp,
    end_time: Timestamp,
    decay_duration: u64,
    safety_deposit: u64,
    resolver_whitelist: BTreeSet<AccountId>,
    fill_watermark: FillWatermark,
    /// Asset not yet paid out to escrows.
    remaining_amount: u64,
    /// Safety deposit not yet paid out to escrows.
    remaining_deposit: u64,
}

impl DutchAuction {
    /// Validate `params` and build the record. Funding is the ledger's job.
    ///
    /// # Errors
    /// `EINVALID_AUCTION_PARAMS`, `EINVALID_HASHES` (also when the segment
    /// count exceeds `max_segments`), `EINVALID_RESOLVER_WHITELIST`.
    pub fn new(
        id: AuctionId,
        maker: AccountId,
        params: AuctionParams,
        max_segments: u32,
    ) -> Result<Self> {
        let invalid = |reason: &str| SwapError::InvalidAuctionParams {
            reason: reason.to_string(),
        };
        if params.starting_amount == 0 {
            return Err(invalid("starting_amount must be positive"));
        }
        if params.safety_deposit == 0 {
            return Err(invalid("safety_deposit must be positive"));
        }
        if params.start_time >= params.end_time {
            return Err(invalid("start_time must precede end_time"));
        }
        if params.ending_amount > params.starting_amount {
            return Err(invalid("ending_amount must not exceed starting_amount"));
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
            starting_amount: params.starting_amount,
            ending_amount: params.ending_amount,
            start_time: params.start_time,
            end_time: params.end_time,
            decay_duration: params.decay_duration,
            safety_deposit: params.safety_deposit,
            resolver_whitelist,
            fill_watermark: FillWatermark::new(),
            remaining_amount: params.starting_amount,
            remaining_deposit: params.safety_deposit,
        })
    }

    /// Price of the whole order at `now`.
    ///
    /// # Errors
    /// `EAUCTION_NOT_STARTED` before `start_time`.
    pub fn current_amount(&self, now: Timestamp) -> Result<u64> {
        if now < self.start_time {
            return Err(SwapError::AuctionNotStarted {
                now,
                start_time: self.start_time,
            });
        }
        let elapsed = now - self.start_time;
        if elapsed >= self.decay_duration {
            return Ok(self.ending_amount);
        }
        let spread = u128::from(self.starting_amount - self.ending_amount);
        let decayed = spread * u128::from(elapsed) / u128::from(self.decay_duration);
        // decayed < spread <= starting_amount, so the narrowing is lossless.
        let decayed = u64::try_from(decayed).unwrap_or(u64::MAX);
        Ok(self.starting_amount.saturating_sub(decayed))
    }

    /// Check a fill by `taker` and compute what it would move.
    ///
    /// # Errors
    /// In order: `EINVALID_RESOLVER`, `EAUCTION_NOT_STARTED`,
    /// `EAUCTION_ENDED`, `EINVALID_FILL_TYPE`, `EINVALID_SEGMENT`,
    /// `ESEGMENT_ALREADY_FILLED`.
    pub fn plan_fill(
        &self,
        taker: AccountId,
        upto_segment: Option<SegmentIndex>,
        now: Timestamp,
    ) -> Result<FillPlan> {
        check_resolver(&self.resolver_whitelist, taker)?;
        let price = self.current_amount(now)?;
        if now >= self.end_time {
            return Err(SwapError::AuctionEnded {
                now,
                end_time: self.end_time,
            });
        }
        plan_segments(
            &self.hashlock,
            self.fill_watermark,
            upto_segment,
            price,
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

    /// Only the maker may cancel, and only before any segment is taken.
    ///
    /// # Errors
    /// `EINVALID_CALLER` for anyone else, `ESEGMENT_ALREADY_FILLED` once
    /// the auction has been partially filled.
    pub fn authorize_cancel(&self, caller: AccountId) -> Result<()> {
        if caller != self.maker {
            return Err(SwapError::InvalidCaller { caller });
        }
        check_untaken(self.fill_watermark)
    }

    /// Segments not yet filled. A single-secret auction counts as one.
    #[must_use]
    pub fn remaining_segments(&self) -> u32 {
        self.fill_watermark
            .remaining(self.hashlock.segment_count())
    }

    #[must_use]
    pub fn id(&self) -> AuctionId {
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
    pub fn starting_amount(&self) -> u64 {
        self.starting_amount
    }

    #[must_use]
    pub fn ending_amount(&self) -> u64 {
        self.ending_amount
    }

    #[must_use]
    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    #[must_use]
    pub fn decay_duration(&self) -> u64 {
        self.decay_duration
    }

    #[must_use]
    pub fn safety_deposit(&self) -> u64 {
        self.safety_deposit
    }

    #[must_use]
    pub fn is_whitelisted(&self, resolver: AccountId) -> bool {
        self.resolver_whitelist.contains(&resolver)
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
