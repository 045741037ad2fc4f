//! End-to-end swap lifecycle tests.
//!
//! These drive the ledger through the full path a cross-chain swap takes:
//! maker funding -> resolver fill -> escrow -> secret reveal or timeout
//! recovery, checking balances and supply conservation at every stop.

use crosslock_engine::{AuctionParams, FusionOrderParams, SwapLedger};
use crosslock_types::{
    AccountId, AuctionId, EngineConfig, EscrowId, FusionOrderId, MerkleTree, OrderHash, Phase,
    Secret, TimelockConfig, Timestamp,
};

const NATIVE: &str = "SUI";
const USDC: &str = "USDC";
const WETH: &str = "WETH";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Helper: a ledger with funded participants.
struct SwapHarness {
    ledger: SwapLedger,
    maker: AccountId,
    resolver: AccountId,
    other_resolver: AccountId,
    stranger: AccountId,
}

impl SwapHarness {
    fn new() -> Self {
        init_tracing();
        let config = EngineConfig {
            // finality 10, exclusive 20, public 30, private cancel 40
            timelock: TimelockConfig {
                finality_duration: 10,
                exclusive_withdrawal_duration: 20,
                public_withdrawal_duration: 30,
                private_cancellation_duration: 40,
            },
            ..EngineConfig::default()
        };
        let mut ledger = SwapLedger::new(config).expect("config is valid");
        let maker = AccountId::new();
        ledger.deposit(maker, USDC, 1_000_000_000).unwrap();
        ledger.deposit(maker, WETH, 1_000_000).unwrap();
        ledger.deposit(maker, NATIVE, 100_000).unwrap();
        Self {
            ledger,
            maker,
            resolver: AccountId::new(),
            other_resolver: AccountId::new(),
            stranger: AccountId::new(),
        }
    }

    fn auction(&mut self, hashes: &[Secret], safety_deposit: u64) -> AuctionId {
        let params = AuctionParams {
            order_hash: OrderHash::derive(b"e2e-auction"),
            hashes: hashes.iter().map(Secret::hash).collect(),
            asset: USDC.into(),
            starting_amount: 1_000_000_000,
            ending_amount: 500_000_000,
            start_time: 1_000,
            end_time: 5_000,
            decay_duration: 500,
            safety_deposit,
            resolver_whitelist: vec![self.resolver, self.other_resolver],
        };
        self.ledger
            .create_auction(self.maker, params, 900)
            .expect("auction creation should succeed")
    }

    fn fusion_order(&mut self, hashes: &[Secret], stale: Option<Timestamp>) -> FusionOrderId {
        let params = FusionOrderParams {
            order_hash: OrderHash::derive(b"e2e-fusion"),
            hashes: hashes.iter().map(Secret::hash).collect(),
            asset: WETH.into(),
            amount: 1_000_000,
            safety_deposit: 10_000,
            resolver_whitelist: vec![self.resolver],
            stale_timestamp: stale,
        };
        self.ledger
            .create_fusion_order(self.maker, params, 900)
            .expect("fusion order creation should succeed")
    }

    fn phase_start(&self, escrow: EscrowId, phase: Phase) -> Timestamp {
        self.ledger
            .escrow(escrow)
            .expect("escrow exists")
            .timelock()
            .phase_start(phase)
    }

    fn assert_conserved(&self) {
        self.ledger.verify_all_supply().expect("supply conserved");
    }
}

// ============================================================================
// Dutch auction, single fill
// ============================================================================

#[test]
fn single_fill_at_quarter_decay_pays_maker_on_withdraw() {
    let mut h = SwapHarness::new();
    let secret = Secret::random();
    let auction = h.auction(std::slice::from_ref(&secret), 10_000);

    let escrow = h
        .ledger
        .deploy_destination_single_fill(h.resolver, auction, 1_250)
        .unwrap();
    assert_eq!(h.ledger.balance(escrow, USDC), 750_000_000);
    assert_eq!(h.ledger.balance(escrow, NATIVE), 10_000);
    // The undecayed remainder went straight back to the maker.
    assert_eq!(h.ledger.balance(h.maker, USDC), 250_000_000);
    assert!(h.ledger.auction(auction).is_none());
    h.assert_conserved();

    let exclusive = h.phase_start(escrow, Phase::ExclusiveWithdrawal);
    h.ledger
        .escrow_withdraw(h.resolver, escrow, secret.as_bytes(), None, exclusive)
        .unwrap();
    assert_eq!(h.ledger.balance(h.maker, USDC), 1_000_000_000);
    assert_eq!(h.ledger.balance(h.resolver, NATIVE), 10_000);
    assert_eq!(h.ledger.in_custody(USDC), 0);
    h.assert_conserved();
}

#[test]
fn auction_window_enforced() {
    let mut h = SwapHarness::new();
    let auction = h.auction(&[Secret::random()], 10_000);
    let err = h
        .ledger
        .deploy_destination_single_fill(h.resolver, auction, 999)
        .unwrap_err();
    assert_eq!(err.code(), "EAUCTION_NOT_STARTED");
    let err = h
        .ledger
        .deploy_destination_single_fill(h.resolver, auction, 5_000)
        .unwrap_err();
    assert_eq!(err.code(), "EAUCTION_ENDED");
    let err = h
        .ledger
        .deploy_destination_single_fill(h.stranger, auction, 1_000)
        .unwrap_err();
    assert_eq!(err.code(), "EINVALID_RESOLVER");
    assert!(h.ledger.auction(auction).is_some());
}

// ============================================================================
// Dutch auction, partial fills
// ============================================================================

#[test]
fn partial_fills_through_completion() {
    let mut h = SwapHarness::new();
    // 11 secrets commit to 10 segments plus the completion secret.
    let secrets = Secret::random_set(11);
    let tree = MerkleTree::from_secrets(&secrets).unwrap();
    let auction = h.auction(&secrets, 10_000);
    assert_eq!(h.ledger.auction(auction).unwrap().remaining_segments(), 10);

    // At start_time the price is the full starting amount.
    let first = h
        .ledger
        .deploy_destination_partial_fill(h.resolver, auction, 2, 1_000)
        .unwrap();
    assert_eq!(h.ledger.balance(first, USDC), 300_000_000);
    assert_eq!(h.ledger.balance(first, NATIVE), 3_000);
    let live = h.ledger.auction(auction).unwrap();
    assert_eq!(live.fill_watermark().get(), Some(2));
    assert_eq!(live.remaining_segments(), 7);

    // Overlapping and out-of-range requests are rejected without effect.
    let err = h
        .ledger
        .deploy_destination_partial_fill(h.other_resolver, auction, 2, 1_000)
        .unwrap_err();
    assert_eq!(err.code(), "ESEGMENT_ALREADY_FILLED");
    let err = h
        .ledger
        .deploy_destination_partial_fill(h.other_resolver, auction, 10, 1_000)
        .unwrap_err();
    assert_eq!(err.code(), "EINVALID_SEGMENT");
    let err = h
        .ledger
        .deploy_destination_single_fill(h.other_resolver, auction, 1_000)
        .unwrap_err();
    assert_eq!(err.code(), "EINVALID_FILL_TYPE");

    // After full decay the price is 500_000_000: segments 3..=9 pay 7/10 of it.
    let last = h
        .ledger
        .deploy_destination_partial_fill(h.other_resolver, auction, 9, 1_600)
        .unwrap();
    assert_eq!(h.ledger.balance(last, USDC), 350_000_000);
    assert_eq!(h.ledger.balance(last, NATIVE), 7_000);
    assert!(h.ledger.auction(auction).is_none());
    // Starting amount minus both payouts is back with the maker.
    assert_eq!(h.ledger.balance(h.maker, USDC), 350_000_000);
    h.assert_conserved();

    // The first escrow opens with leaf 2, the completing one with leaf 10.
    assert_eq!(h.ledger.escrow(first).unwrap().secret_index(), 2);
    assert_eq!(h.ledger.escrow(last).unwrap().secret_index(), 10);

    let t = h.phase_start(first, Phase::ExclusiveWithdrawal);
    let err = h
        .ledger
        .escrow_withdraw(
            h.resolver,
            first,
            secrets[3].as_bytes(),
            tree.proof(3).as_ref(),
            t,
        )
        .unwrap_err();
    assert_eq!(err.code(), "EINVALID_SECRET");
    h.ledger
        .escrow_withdraw(
            h.resolver,
            first,
            secrets[2].as_bytes(),
            tree.proof(2).as_ref(),
            t,
        )
        .unwrap();

    let t = h.phase_start(last, Phase::PublicWithdrawal);
    h.ledger
        .escrow_withdraw(
            h.stranger,
            last,
            secrets[10].as_bytes(),
            tree.proof(10).as_ref(),
            t,
        )
        .unwrap();
    assert_eq!(h.ledger.balance(h.maker, USDC), 1_000_000_000);
    assert_eq!(h.ledger.balance(h.resolver, NATIVE), 3_000);
    assert_eq!(h.ledger.balance(h.stranger, NATIVE), 7_000);
    h.assert_conserved();
}

#[test]
fn partially_filled_auction_cannot_be_cancelled() {
    let mut h = SwapHarness::new();
    let secrets = Secret::random_set(5);
    let auction = h.auction(&secrets, 10_000);
    h.ledger
        .deploy_destination_partial_fill(h.resolver, auction, 0, 1_000)
        .unwrap();
    let events = h.ledger.events().len();

    let err = h.ledger.cancel_auction(h.maker, auction, 1_100).unwrap_err();
    assert_eq!(err.code(), "ESEGMENT_ALREADY_FILLED");

    // Nothing moved: the auction keeps its remainder and the maker gets nothing back.
    assert!(h.ledger.auction(auction).is_some());
    assert_eq!(h.ledger.balance(h.maker, USDC), 0);
    assert_eq!(h.ledger.balance(h.maker, NATIVE), 90_000);
    assert_eq!(h.ledger.in_custody(USDC), 1_000_000_000);
    assert_eq!(h.ledger.events().len(), events);
    h.assert_conserved();
}

// ============================================================================
// Fusion orders
// ============================================================================

#[test]
fn stale_fusion_order_cancel() {
    let mut h = SwapHarness::new();
    let order = h.fusion_order(&[Secret::random()], Some(2_000));

    let err = h
        .ledger
        .cancel_fusion_order(h.stranger, order, 1_999)
        .unwrap_err();
    assert_eq!(err.code(), "EINVALID_CALLER");
    assert!(h.ledger.fusion_order(order).is_some());

    h.ledger.cancel_fusion_order(h.stranger, order, 2_000).unwrap();
    assert_eq!(h.ledger.balance(h.maker, WETH), 1_000_000);
    assert_eq!(h.ledger.balance(h.stranger, NATIVE), 10_000);
    assert_eq!(h.ledger.balance(h.maker, NATIVE), 90_000);
    assert!(h.ledger.fusion_order(order).is_none());
    h.assert_conserved();
}

#[test]
fn partially_taken_fusion_order_cannot_be_cancelled() {
    let mut h = SwapHarness::new();
    let order = h.fusion_order(&Secret::random_set(4), Some(2_000));
    h.ledger
        .deploy_source_partial_fill(h.resolver, order, 0, 1_000)
        .unwrap();
    let events = h.ledger.events().len();

    let err = h
        .ledger
        .cancel_fusion_order(h.maker, order, 1_100)
        .unwrap_err();
    assert_eq!(err.code(), "ESEGMENT_ALREADY_FILLED");

    // Past the stale timestamp a third party is refused the same way.
    let err = h
        .ledger
        .cancel_fusion_order(h.stranger, order, 2_000)
        .unwrap_err();
    assert_eq!(err.code(), "ESEGMENT_ALREADY_FILLED");

    assert!(h.ledger.fusion_order(order).is_some());
    assert_eq!(h.ledger.balance(h.maker, WETH), 0);
    assert_eq!(h.ledger.balance(h.maker, NATIVE), 90_000);
    assert_eq!(h.ledger.balance(h.stranger, NATIVE), 0);
    assert_eq!(h.ledger.in_custody(WETH), 1_000_000);
    assert_eq!(h.ledger.events().len(), events);
    h.assert_conserved();
}

#[test]
fn source_withdraw_pays_taker() {
    let mut h = SwapHarness::new();
    let secret = Secret::random();
    let order = h.fusion_order(std::slice::from_ref(&secret), None);
    let escrow = h
        .ledger
        .deploy_source_single_fill(h.resolver, order, 1_000)
        .unwrap();
    assert!(h.ledger.escrow(escrow).unwrap().is_source_chain());

    let t = h.phase_start(escrow, Phase::ExclusiveWithdrawal);
    h.ledger
        .escrow_withdraw(h.resolver, escrow, secret.as_bytes(), None, t)
        .unwrap();
    assert_eq!(h.ledger.balance(h.resolver, WETH), 1_000_000);
    assert_eq!(h.ledger.balance(h.resolver, NATIVE), 10_000);
    h.assert_conserved();
}

#[test]
fn fusion_partial_fills_split_exactly() {
    let mut h = SwapHarness::new();
    let secrets = Secret::random_set(4);
    let order = h.fusion_order(&secrets, None);
    let a = h
        .ledger
        .deploy_source_partial_fill(h.resolver, order, 0, 1_000)
        .unwrap();
    let b = h
        .ledger
        .deploy_source_partial_fill(h.resolver, order, 2, 1_001)
        .unwrap();
    assert_eq!(h.ledger.balance(a, WETH), 333_333);
    assert_eq!(h.ledger.balance(b, WETH), 666_667);
    assert_eq!(h.ledger.balance(a, NATIVE) + h.ledger.balance(b, NATIVE), 10_000);
    assert!(h.ledger.fusion_order(order).is_none());
    h.assert_conserved();
}

// ============================================================================
// Escrow timelock
// ============================================================================

#[test]
fn third_party_public_cancellation_recovery() {
    let mut h = SwapHarness::new();
    let order = h.fusion_order(&[Secret::random()], None);
    let escrow = h
        .ledger
        .deploy_source_single_fill(h.resolver, order, 1_000)
        .unwrap();

    let private = h.phase_start(escrow, Phase::PrivateCancellation);
    let err = h
        .ledger
        .escrow_recovery(h.stranger, escrow, private)
        .unwrap_err();
    assert_eq!(err.code(), "EINVALID_CALLER");

    let public = h.phase_start(escrow, Phase::PublicCancellation);
    h.ledger.escrow_recovery(h.stranger, escrow, public).unwrap();
    // Source side: the asset returns to the maker, the deposit rewards the caller.
    assert_eq!(h.ledger.balance(h.maker, WETH), 1_000_000);
    assert_eq!(h.ledger.balance(h.stranger, NATIVE), 10_000);
    h.assert_conserved();
}

#[test]
fn destination_recovery_returns_to_taker() {
    let mut h = SwapHarness::new();
    let auction = h.auction(&[Secret::random()], 10_000);
    let escrow = h
        .ledger
        .deploy_destination_single_fill(h.resolver, auction, 1_000)
        .unwrap();
    let t = h.phase_start(escrow, Phase::PrivateCancellation);
    h.ledger.escrow_recovery(h.resolver, escrow, t).unwrap();
    assert_eq!(h.ledger.balance(h.resolver, USDC), 1_000_000_000);
    assert_eq!(h.ledger.balance(h.resolver, NATIVE), 10_000);
}

#[test]
fn phase_gates_withdraw_and_recovery() {
    let mut h = SwapHarness::new();
    let secret = Secret::random();
    let order = h.fusion_order(std::slice::from_ref(&secret), None);
    let escrow = h
        .ledger
        .deploy_source_single_fill(h.resolver, order, 1_000)
        .unwrap();

    for phase in Phase::ALL {
        let t = h.phase_start(escrow, phase);
        let withdraw = h
            .ledger
            .escrow(escrow)
            .unwrap()
            .authorize_withdraw(h.resolver, secret.as_bytes(), None, t);
        let recovery = h.ledger.escrow(escrow).unwrap().authorize_recovery(h.resolver, t);
        assert_eq!(withdraw.is_ok(), phase.allows_withdraw(), "{phase}");
        assert_eq!(recovery.is_ok(), phase.allows_recovery(), "{phase}");
    }
    // Finality allows neither.
    let t = h.phase_start(escrow, Phase::Finality);
    assert_eq!(
        h.ledger
            .escrow_recovery(h.resolver, escrow, t)
            .unwrap_err()
            .code(),
        "EINVALID_PHASE"
    );
}

#[test]
fn second_resolution_fails() {
    let mut h = SwapHarness::new();
    let secret = Secret::random();
    let order = h.fusion_order(std::slice::from_ref(&secret), None);
    let escrow = h
        .ledger
        .deploy_source_single_fill(h.resolver, order, 1_000)
        .unwrap();
    let t = h.phase_start(escrow, Phase::PublicWithdrawal);
    h.ledger
        .escrow_withdraw(h.stranger, escrow, secret.as_bytes(), None, t)
        .unwrap();

    let err = h
        .ledger
        .escrow_withdraw(h.stranger, escrow, secret.as_bytes(), None, t)
        .unwrap_err();
    assert_eq!(err.code(), "EOBJECT_DOES_NOT_EXIST");
    let later = t + 1_000;
    let err = h.ledger.escrow_recovery(h.stranger, escrow, later).unwrap_err();
    assert_eq!(err.code(), "EOBJECT_DOES_NOT_EXIST");
}

#[test]
fn rejected_calls_leave_state_untouched() {
    let mut h = SwapHarness::new();
    let secret = Secret::random();
    let order = h.fusion_order(std::slice::from_ref(&secret), None);
    let escrow = h
        .ledger
        .deploy_source_single_fill(h.resolver, order, 1_000)
        .unwrap();
    let events_before = h.ledger.events().len();
    let holdings_before = h.ledger.holdings(escrow);

    let t = h.phase_start(escrow, Phase::ExclusiveWithdrawal);
    assert!(
        h.ledger
            .escrow_withdraw(h.resolver, escrow, b"not the secret", None, t)
            .is_err()
    );
    assert!(h.ledger.escrow_recovery(h.resolver, escrow, t).is_err());

    assert_eq!(h.ledger.events().len(), events_before);
    assert_eq!(h.ledger.holdings(escrow), holdings_before);
    assert!(h.ledger.escrow(escrow).is_some());
}

// ============================================================================
// Event log
// ============================================================================

#[test]
fn event_log_tracks_lifecycle() {
    let mut h = SwapHarness::new();
    let secret = Secret::random();
    let order = h.fusion_order(std::slice::from_ref(&secret), None);
    let escrow = h
        .ledger
        .deploy_source_single_fill(h.resolver, order, 1_000)
        .unwrap();
    let t = h.phase_start(escrow, Phase::ExclusiveWithdrawal);
    h.ledger
        .escrow_withdraw(h.resolver, escrow, secret.as_bytes(), None, t)
        .unwrap();

    let names: Vec<&str> = h.ledger.events().iter().map(|e| e.kind.name()).collect();
    assert_eq!(
        names,
        vec!["FUSION_ORDER_CREATED", "FUSION_ORDER_FILLED", "ESCROW_WITHDRAWN"]
    );
    let json = serde_json::to_string(h.ledger.events()).unwrap();
    assert!(json.contains("EscrowWithdrawn"));
}
