//! Supply conservation invariant checker.
//!
//! ```text
//! ∀ asset: Σ(account balances) + Σ(object custody) == Σ(deposits) - Σ(withdrawals)
//! ```
//!
//! Fills, withdrawals, recoveries and cancellations only move funds between
//! holders, so none of them may change the left-hand side.

use std::collections::{BTreeSet, HashMap};

use crosslock_types::{Asset, Result, SwapError};

/// Tracks per-asset inflow and outflow across the system boundary.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    /// Total deposits per asset since genesis.
    deposits: HashMap<Asset, u128>,
    /// Total external withdrawals per asset since genesis.
    withdrawals: HashMap<Asset, u128>,
}

impl SupplyConservation {
    /// Create a new supply conservation tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            deposits: HashMap::new(),
            withdrawals: HashMap::new(),
        }
    }

    /// Record funds entering the system.
    pub fn record_deposit(&mut self, asset: &str, amount: u64) {
        *self.deposits.entry(asset.to_string()).or_default() += u128::from(amount);
    }

    /// Record funds leaving the system.
    pub fn record_withdrawal(&mut self, asset: &str, amount: u64) {
        *self.withdrawals.entry(asset.to_string()).or_default() += u128::from(amount);
    }

    /// Expected total supply for an asset: deposits - withdrawals.
    #[must_use]
    pub fn expected_supply(&self, asset: &str) -> u128 {
        self.total_deposits(asset)
            .saturating_sub(self.total_withdrawals(asset))
    }

    /// Check the actual supply against the expected supply.
    ///
    /// # Errors
    /// Returns [`SwapError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self, asset: &str, actual_supply: u128) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            tracing::error!(
                asset,
                actual = %actual_supply,
                expected = %expected,
                "Supply invariant violated"
            );
            return Err(SwapError::SupplyInvariantViolation {
                reason: format!(
                    "Asset {asset}: actual supply {actual_supply} != expected {expected} \
                     (deposits={}, withdrawals={})",
                    self.total_deposits(asset),
                    self.total_withdrawals(asset),
                ),
            });
        }
        Ok(())
    }

    /// All assets that have ever crossed the boundary, sorted.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<Asset> {
        let assets: BTreeSet<&Asset> = self.deposits.keys().chain(self.withdrawals.keys()).collect();
        assets.into_iter().cloned().collect()
    }

    #[must_use]
    pub fn total_deposits(&self, asset: &str) -> u128 {
        self.deposits.get(asset).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_withdrawals(&self, asset: &str) -> u128 {
        self.withdrawals.get(asset).copied().unwrap_or(0)
    }
}
