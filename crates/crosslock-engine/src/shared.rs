//! Thread-safe handle to a [`SwapLedger`].
//!
//! Every call takes the lock, reads the clock, and runs the whole
//! check-and-update under the lock. Calls are therefore totally ordered:
//! of two racing fills over overlapping segments, whichever takes the lock
//! first wins and the other sees the advanced watermark.

use std::sync::Arc;

use crosslock_types::{
    AccountId, AuctionId, Clock, EscrowId, FusionOrderId, MerkleProof, Result, SegmentIndex,
    SystemClock, Timestamp,
};
use parking_lot::Mutex;

use crate::auction::AuctionParams;
use crate::fusion_order::FusionOrderParams;
use crate::ledger::SwapLedger;

#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<SwapLedger>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SharedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLedger")
            .field("now", &self.clock.now())
            .finish_non_exhaustive()
    }
}

impl SharedLedger {
    #[must_use]
    pub fn new(ledger: SwapLedger, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
            clock,
        }
    }

    /// Share `ledger` using wall-clock time.
    #[must_use]
    pub fn with_system_clock(ledger: SwapLedger) -> Self {
        Self::new(ledger, Arc::new(SystemClock))
    }

    /// Current ledger time.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Run `f` against the ledger under the lock, for reads.
    pub fn read<R>(&self, f: impl FnOnce(&SwapLedger) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Run `f` with exclusive access and the current time.
    fn with_now<R>(&self, f: impl FnOnce(&mut SwapLedger, Timestamp) -> R) -> R {
        let mut ledger = self.inner.lock();
        let now = self.clock.now();
        f(&mut ledger, now)
    }

    pub fn deposit(&self, account: AccountId, asset: &str, amount: u64) -> Result<()> {
        self.inner.lock().deposit(account, asset, amount)
    }

    pub fn withdraw_external(&self, account: AccountId, asset: &str, amount: u64) -> Result<()> {
        self.inner.lock().withdraw_external(account, asset, amount)
    }

    pub fn create_auction(&self, maker: AccountId, params: AuctionParams) -> Result<AuctionId> {
        self.with_now(|l, now| l.create_auction(maker, params, now))
    }

    pub fn cancel_auction(&self, caller: AccountId, auction: AuctionId) -> Result<()> {
        self.with_now(|l, now| l.cancel_auction(caller, auction, now))
    }

    pub fn create_fusion_order(
        &self,
        maker: AccountId,
        params: FusionOrderParams,
    ) -> Result<FusionOrderId> {
        self.with_now(|l, now| l.create_fusion_order(maker, params, now))
    }

    pub fn cancel_fusion_order(&self, caller: AccountId, order: FusionOrderId) -> Result<()> {
        self.with_now(|l, now| l.cancel_fusion_order(caller, order, now))
    }

    pub fn deploy_source_single_fill(
        &self,
        taker: AccountId,
        order: FusionOrderId,
    ) -> Result<EscrowId> {
        self.with_now(|l, now| l.deploy_source_single_fill(taker, order, now))
    }

    pub fn deploy_source_partial_fill(
        &self,
        taker: AccountId,
        order: FusionOrderId,
        upto_segment: SegmentIndex,
    ) -> Result<EscrowId> {
        self.with_now(|l, now| l.deploy_source_partial_fill(taker, order, upto_segment, now))
    }

    pub fn deploy_destination_single_fill(
        &self,
        taker: AccountId,
        auction: AuctionId,
    ) -> Result<EscrowId> {
        self.with_now(|l, now| l.deploy_destination_single_fill(taker, auction, now))
    }

    pub fn deploy_destination_partial_fill(
        &self,
        taker: AccountId,
        auction: AuctionId,
        upto_segment: SegmentIndex,
    ) -> Result<EscrowId> {
        self.with_now(|l, now| l.deploy_destination_partial_fill(taker, auction, upto_segment, now))
    }

    pub fn escrow_withdraw(
        &self,
        caller: AccountId,
        escrow: EscrowId,
        secret: &[u8],
        proof: Option<&MerkleProof>,
    ) -> Result<()> {
        self.with_now(|l, now| l.escrow_withdraw(caller, escrow, secret, proof, now))
    }

    pub fn escrow_recovery(&self, caller: AccountId, escrow: EscrowId) -> Result<()> {
        self.with_now(|l, now| l.escrow_recovery(caller, escrow, now))
    }
}
