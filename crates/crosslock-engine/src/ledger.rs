//! # Swap ledger
//!
//! The registry of live auctions, fusion orders and escrows, on top of an
//! [`AssetStore`]. Every operation here is one atomic mutation: it is
//! planned against the current state, its funds move in one
//! [`AssetStore::apply`] batch, and only then do registries and watermarks
//! change. A rejected call leaves the ledger exactly as it was.
//!
//! ```text
//! maker ──create──▶ DutchAuction / FusionOrder ──fill──▶ Escrow
//!                                                          │
//!                      withdraw (secret) / recovery ◀──────┘
//! ```

use std::collections::HashMap;

use crosslock_ledger::{AssetStore, SupplyConservation, Transfer};
use crosslock_types::{
    AccountId, Asset, AuctionId, EngineConfig, EscrowId, FusionOrderId, Holder, MerkleProof,
    Result, SegmentIndex, SwapError, SwapEvent, SwapEventKind, Timestamp, constants,
};

use crate::auction::{AuctionParams, DutchAuction};
use crate::escrow::{Escrow, Resolution};
use crate::fill::FillPlan;
use crate::fusion_order::{FusionOrder, FusionOrderParams};

/// Single-threaded swap ledger. Wrap it in a
/// [`SharedLedger`](crate::SharedLedger) to share it between threads.
#[derive(Debug)]
pub struct SwapLedger {
    config: EngineConfig,
    store: AssetStore,
    supply: SupplyConservation,
    auctions: HashMap<AuctionId, DutchAuction>,
    fusion_orders: HashMap<FusionOrderId, FusionOrder>,
    escrows: HashMap<EscrowId, Escrow>,
    events: Vec<SwapEvent>,
}

impl SwapLedger {
    /// Create an empty ledger.
    ///
    /// # Errors
    /// `ECONFIGURATION` if `config` does not validate.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            native_asset = %config.native_asset,
            max_segments = config.max_segments,
            "Swap ledger initialized"
        );
        Ok(Self {
            config,
            store: AssetStore::new(),
            supply: SupplyConservation::new(),
            auctions: HashMap::new(),
            fusion_orders: HashMap::new(),
            escrows: HashMap::new(),
            events: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Boundary: funds entering and leaving the system
    // ------------------------------------------------------------------

    /// Credit `account` with funds from outside the system.
    pub fn deposit(&mut self, account: AccountId, asset: &str, amount: u64) -> Result<()> {
        self.store.deposit(account, asset, amount)?;
        self.supply.record_deposit(asset, amount);
        tracing::debug!(account = %account, asset, amount, "Deposit");
        Ok(())
    }

    /// Take funds out of the system from `account`.
    pub fn withdraw_external(&mut self, account: AccountId, asset: &str, amount: u64) -> Result<()> {
        self.store.burn(account, asset, amount)?;
        self.supply.record_withdrawal(asset, amount);
        tracing::debug!(account = %account, asset, amount, "External withdrawal");
        Ok(())
    }

    /// Prove that balances held across accounts and objects equal
    /// deposits minus withdrawals for `asset`.
    ///
    /// # Errors
    /// `ESUPPLY_INVARIANT` on mismatch.
    pub fn verify_supply(&self, asset: &str) -> Result<()> {
        self.supply.verify(asset, self.store.total_supply(asset))
    }

    /// [`verify_supply`](Self::verify_supply) for every asset ever deposited.
    pub fn verify_all_supply(&self) -> Result<()> {
        for asset in self.supply.tracked_assets() {
            self.verify_supply(&asset)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dutch auctions (destination side)
    // ------------------------------------------------------------------

    /// Create an auction funded by `maker` with `starting_amount` of the
    /// asset and the full safety deposit.
    ///
    /// # Errors
    /// Parameter errors from [`DutchAuction::new`], or
    /// `EINSUFFICIENT_BALANCE` if the maker cannot fund it.
    pub fn create_auction(
        &mut self,
        maker: AccountId,
        params: AuctionParams,
        now: Timestamp,
    ) -> Result<AuctionId> {
        let id = AuctionId::new();
        let auction = DutchAuction::new(id, maker, params, self.config.max_segments)?;
        self.store.apply(&[
            Transfer::new(maker, id, auction.asset(), auction.starting_amount()),
            Transfer::new(maker, id, &self.config.native_asset, auction.safety_deposit()),
        ])?;

        tracing::info!(
            auction = %id,
            maker = %maker,
            asset = auction.asset(),
            starting_amount = auction.starting_amount(),
            ending_amount = auction.ending_amount(),
            segments = auction.hashlock().segment_count(),
            "Auction created"
        );
        self.record(
            now,
            SwapEventKind::AuctionCreated {
                auction: id,
                maker,
                order_hash: auction.order_hash(),
                starting_amount: auction.starting_amount(),
                safety_deposit: auction.safety_deposit(),
                segments: auction.hashlock().segment_count(),
            },
        );
        self.auctions.insert(id, auction);
        Ok(id)
    }

    /// Cancel an untouched auction, returning its asset and safety deposit
    /// to the maker.
    ///
    /// # Errors
    /// `EOBJECT_DOES_NOT_EXIST`, `EINVALID_CALLER`, and
    /// `ESEGMENT_ALREADY_FILLED` once any segment has been taken.
    pub fn cancel_auction(
        &mut self,
        caller: AccountId,
        id: AuctionId,
        now: Timestamp,
    ) -> Result<()> {
        let auction = self.auctions.get(&id).ok_or_else(|| missing(id))?;
        auction.authorize_cancel(caller).inspect_err(|e| {
            tracing::warn!(auction = %id, caller = %caller, code = e.code(), "Cancel rejected");
        })?;
        let (maker, refunded_amount, refunded_deposit) = (
            auction.maker(),
            auction.remaining_amount(),
            auction.remaining_deposit(),
        );
        self.store.apply(&[
            Transfer::new(id, maker, auction.asset(), refunded_amount),
            Transfer::new(id, maker, &self.config.native_asset, refunded_deposit),
        ])?;
        self.auctions.remove(&id);

        tracing::info!(auction = %id, refunded_amount, refunded_deposit, "Auction cancelled");
        self.record(
            now,
            SwapEventKind::AuctionCancelled {
                auction: id,
                refunded_amount,
                refunded_deposit,
            },
        );
        Ok(())
    }

    /// Fill a single-secret auction in full at the current price.
    pub fn deploy_destination_single_fill(
        &mut self,
        taker: AccountId,
        auction: AuctionId,
        now: Timestamp,
    ) -> Result<EscrowId> {
        self.fill_auction(taker, auction, None, now)
    }

    /// Fill a partially fillable auction up through `upto_segment`.
    pub fn deploy_destination_partial_fill(
        &mut self,
        taker: AccountId,
        auction: AuctionId,
        upto_segment: SegmentIndex,
        now: Timestamp,
    ) -> Result<EscrowId> {
        self.fill_auction(taker, auction, Some(upto_segment), now)
    }

    fn fill_auction(
        &mut self,
        taker: AccountId,
        id: AuctionId,
        upto_segment: Option<SegmentIndex>,
        now: Timestamp,
    ) -> Result<EscrowId> {
        let auction = self.auctions.get(&id).ok_or_else(|| missing(id))?;
        let plan = auction.plan_fill(taker, upto_segment, now).inspect_err(|e| {
            tracing::warn!(auction = %id, taker = %taker, code = e.code(), "Fill rejected");
        })?;
        tracing::debug!(auction = %id, ?plan, "Fill planned");

        let escrow = Escrow::new(
            auction.order_hash(),
            self.config.timelock.start_at(now),
            *auction.hashlock(),
            auction.asset().to_string(),
            auction.maker(),
            taker,
            false,
            &plan,
        );
        let transfers = fill_transfers(id.into(), &escrow, &plan, &self.config.native_asset);
        self.store.apply(&transfers)?;

        if plan.completes {
            self.auctions.remove(&id);
        } else if let Some(auction) = self.auctions.get_mut(&id) {
            auction.commit_fill(&plan)?;
        }

        let escrow_id = escrow.id();
        tracing::info!(
            auction = %id,
            escrow = %escrow_id,
            taker = %taker,
            amount = plan.amount,
            safety_deposit = plan.safety_deposit,
            completed = plan.completes,
            "Auction filled"
        );
        self.record(
            now,
            SwapEventKind::AuctionFilled {
                auction: id,
                escrow: escrow_id,
                taker,
                segments: plan.segments,
                amount: plan.amount,
                safety_deposit: plan.safety_deposit,
                completed: plan.completes,
            },
        );
        self.escrows.insert(escrow_id, escrow);
        Ok(escrow_id)
    }

    // ------------------------------------------------------------------
    // Fusion orders (source side)
    // ------------------------------------------------------------------

    /// Create a fusion order funded by `maker`.
    ///
    /// # Errors
    /// Parameter errors from [`FusionOrder::new`], or
    /// `EINSUFFICIENT_BALANCE`.
    pub fn create_fusion_order(
        &mut self,
        maker: AccountId,
        params: FusionOrderParams,
        now: Timestamp,
    ) -> Result<FusionOrderId> {
        let id = FusionOrderId::new();
        let order = FusionOrder::new(id, maker, params, self.config.max_segments)?;
        self.store.apply(&[
            Transfer::new(maker, id, order.asset(), order.amount()),
            Transfer::new(maker, id, &self.config.native_asset, order.safety_deposit()),
        ])?;

        tracing::info!(
            order = %id,
            maker = %maker,
            asset = order.asset(),
            amount = order.amount(),
            segments = order.hashlock().segment_count(),
            "Fusion order created"
        );
        self.record(
            now,
            SwapEventKind::FusionOrderCreated {
                order: id,
                maker,
                order_hash: order.order_hash(),
                amount: order.amount(),
                safety_deposit: order.safety_deposit(),
                segments: order.hashlock().segment_count(),
            },
        );
        self.fusion_orders.insert(id, order);
        Ok(id)
    }

    /// Cancel a fusion order before anyone takes it. The maker may cancel
    /// at any time until then; anyone may once the order's stale timestamp
    /// has passed, and collects the deposit.
    ///
    /// # Errors
    /// `EOBJECT_DOES_NOT_EXIST`, `EINVALID_CALLER`, `ESEGMENT_ALREADY_FILLED`.
    pub fn cancel_fusion_order(
        &mut self,
        caller: AccountId,
        id: FusionOrderId,
        now: Timestamp,
    ) -> Result<()> {
        let order = self.fusion_orders.get(&id).ok_or_else(|| missing(id))?;
        let payout = order.authorize_cancel(caller, now).inspect_err(|e| {
            tracing::warn!(order = %id, caller = %caller, code = e.code(), "Cancel rejected");
        })?;
        self.store.apply(&[
            Transfer::new(id, payout.asset_to, order.asset(), order.remaining_amount()),
            Transfer::new(
                id,
                payout.deposit_to,
                &self.config.native_asset,
                order.remaining_deposit(),
            ),
        ])?;
        self.fusion_orders.remove(&id);

        tracing::info!(order = %id, caller = %caller, stale = payout.stale, "Fusion order cancelled");
        self.record(
            now,
            SwapEventKind::FusionOrderCancelled {
                order: id,
                caller,
                stale: payout.stale,
            },
        );
        Ok(())
    }

    /// Fill a single-secret fusion order in full.
    pub fn deploy_source_single_fill(
        &mut self,
        taker: AccountId,
        order: FusionOrderId,
        now: Timestamp,
    ) -> Result<EscrowId> {
        self.fill_fusion_order(taker, order, None, now)
    }

    /// Fill a partially fillable fusion order up through `upto_segment`.
    pub fn deploy_source_partial_fill(
        &mut self,
        taker: AccountId,
        order: FusionOrderId,
        upto_segment: SegmentIndex,
        now: Timestamp,
    ) -> Result<EscrowId> {
        self.fill_fusion_order(taker, order, Some(upto_segment), now)
    }

    fn fill_fusion_order(
        &mut self,
        taker: AccountId,
        id: FusionOrderId,
        upto_segment: Option<SegmentIndex>,
        now: Timestamp,
    ) -> Result<EscrowId> {
        let order = self.fusion_orders.get(&id).ok_or_else(|| missing(id))?;
        let plan = order.plan_fill(taker, upto_segment).inspect_err(|e| {
            tracing::warn!(order = %id, taker = %taker, code = e.code(), "Fill rejected");
        })?;
        tracing::debug!(order = %id, ?plan, "Fill planned");

        let escrow = Escrow::new(
            order.order_hash(),
            self.config.timelock.start_at(now),
            *order.hashlock(),
            order.asset().to_string(),
            order.maker(),
            taker,
            true,
            &plan,
        );
        let transfers = fill_transfers(id.into(), &escrow, &plan, &self.config.native_asset);
        self.store.apply(&transfers)?;

        if plan.completes {
            self.fusion_orders.remove(&id);
        } else if let Some(order) = self.fusion_orders.get_mut(&id) {
            order.commit_fill(&plan)?;
        }

        let escrow_id = escrow.id();
        tracing::info!(
            order = %id,
            escrow = %escrow_id,
            taker = %taker,
            amount = plan.amount,
            completed = plan.completes,
            "Fusion order filled"
        );
        self.record(
            now,
            SwapEventKind::FusionOrderFilled {
                order: id,
                escrow: escrow_id,
                taker,
                segments: plan.segments,
                amount: plan.amount,
                safety_deposit: plan.safety_deposit,
                completed: plan.completes,
            },
        );
        self.escrows.insert(escrow_id, escrow);
        Ok(escrow_id)
    }

    // ------------------------------------------------------------------
    // Escrows
    // ------------------------------------------------------------------

    /// Reveal `secret` to release an escrow to its counterparty.
    ///
    /// # Errors
    /// `EOBJECT_DOES_NOT_EXIST`, `EINVALID_PHASE`, `EINVALID_CALLER`,
    /// `EINVALID_SECRET`.
    pub fn escrow_withdraw(
        &mut self,
        caller: AccountId,
        id: EscrowId,
        secret: &[u8],
        proof: Option<&MerkleProof>,
        now: Timestamp,
    ) -> Result<()> {
        let escrow = self.escrows.get(&id).ok_or_else(|| missing(id))?;
        let resolution = escrow
            .authorize_withdraw(caller, secret, proof, now)
            .inspect_err(|e| {
                tracing::warn!(escrow = %id, caller = %caller, code = e.code(), "Withdraw rejected");
            })?;
        self.resolve(id, resolution)?;

        tracing::info!(
            escrow = %id,
            caller = %caller,
            phase = %resolution.phase,
            recipient = %resolution.asset_to,
            "Escrow withdrawn"
        );
        self.record(
            now,
            SwapEventKind::EscrowWithdrawn {
                escrow: id,
                caller,
                phase: resolution.phase,
                asset_recipient: resolution.asset_to,
            },
        );
        Ok(())
    }

    /// Return an unclaimed escrow's asset to where it came from.
    ///
    /// # Errors
    /// `EOBJECT_DOES_NOT_EXIST`, `EINVALID_PHASE`, `EINVALID_CALLER`.
    pub fn escrow_recovery(&mut self, caller: AccountId, id: EscrowId, now: Timestamp) -> Result<()> {
        let escrow = self.escrows.get(&id).ok_or_else(|| missing(id))?;
        let resolution = escrow.authorize_recovery(caller, now).inspect_err(|e| {
            tracing::warn!(escrow = %id, caller = %caller, code = e.code(), "Recovery rejected");
        })?;
        self.resolve(id, resolution)?;

        tracing::info!(
            escrow = %id,
            caller = %caller,
            phase = %resolution.phase,
            recipient = %resolution.asset_to,
            "Escrow recovered"
        );
        self.record(
            now,
            SwapEventKind::EscrowRecovered {
                escrow: id,
                caller,
                phase: resolution.phase,
                asset_recipient: resolution.asset_to,
            },
        );
        Ok(())
    }

    /// Pay out and delete an escrow.
    fn resolve(&mut self, id: EscrowId, resolution: Resolution) -> Result<()> {
        let escrow = self.escrows.get(&id).ok_or_else(|| missing(id))?;
        self.store.apply(&[
            Transfer::new(id, resolution.asset_to, escrow.asset(), escrow.amount()),
            Transfer::new(
                id,
                resolution.deposit_to,
                &self.config.native_asset,
                escrow.safety_deposit(),
            ),
        ])?;
        self.escrows.remove(&id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn auction(&self, id: AuctionId) -> Option<&DutchAuction> {
        self.auctions.get(&id)
    }

    #[must_use]
    pub fn fusion_order(&self, id: FusionOrderId) -> Option<&FusionOrder> {
        self.fusion_orders.get(&id)
    }

    #[must_use]
    pub fn escrow(&self, id: EscrowId) -> Option<&Escrow> {
        self.escrows.get(&id)
    }

    /// Balance of an account or swap object.
    #[must_use]
    pub fn balance(&self, holder: impl Into<Holder>, asset: &str) -> u64 {
        self.store.balance(holder, asset)
    }

    #[must_use]
    pub fn holdings(&self, holder: impl Into<Holder>) -> Vec<(Asset, u64)> {
        self.store.holdings(holder)
    }

    /// Amount of `asset` currently held by auctions, orders and escrows.
    #[must_use]
    pub fn in_custody(&self, asset: &str) -> u128 {
        self.store.in_custody(asset)
    }

    /// The event log, oldest first.
    #[must_use]
    pub fn events(&self) -> &[SwapEvent] {
        &self.events
    }

    fn record(&mut self, at: Timestamp, kind: SwapEventKind) {
        let sequence = u64::try_from(self.events.len()).unwrap_or(u64::MAX);
        tracing::trace!(sequence, event = kind.name(), "Event recorded");
        self.events.push(SwapEvent { sequence, at, kind });
    }
}

fn missing(id: impl std::fmt::Display) -> SwapError {
    SwapError::ObjectDoesNotExist(id.to_string())
}

/// Transfers moving a fill into its escrow. A completing fill also sweeps
/// whatever the order still holds back to the maker.
fn fill_transfers(source: Holder, escrow: &Escrow, plan: &FillPlan, native: &str) -> Vec<Transfer> {
    let mut transfers = vec![
        Transfer::new(source, escrow.id(), escrow.asset(), plan.amount),
        Transfer::new(source, escrow.id(), native, plan.safety_deposit),
    ];
    if plan.completes {
        transfers.push(Transfer::new(source, escrow.maker(), escrow.asset(), plan.residual_amount));
        transfers.push(Transfer::new(source, escrow.maker(), native, plan.residual_deposit));
    }
    transfers
}
