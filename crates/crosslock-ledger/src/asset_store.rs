//! The asset store: balances per (holder, asset).
//!
//! Holders are accounts or swap objects. Funds only ever move through
//! [`AssetStore::apply`], which validates a whole batch of transfers before
//! touching any balance: either every transfer in the batch happens or
//! none does.

use std::collections::HashMap;

use crosslock_types::{AccountId, Asset, Holder, Result, SwapError};

/// A single movement of funds between two holders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Holder,
    pub to: Holder,
    pub asset: Asset,
    pub amount: u64,
}

impl Transfer {
    #[must_use]
    pub fn new(from: impl Into<Holder>, to: impl Into<Holder>, asset: &str, amount: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            asset: asset.to_string(),
            amount,
        }
    }
}

/// Tracks every balance in the system.
///
/// Entries that drop to zero are removed, so a resolved object leaves no
/// residue behind.
#[derive(Debug, Default)]
pub struct AssetStore {
    balances: HashMap<(Holder, Asset), u64>,
}

impl AssetStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Credit an account with externally sourced funds.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if the balance would exceed `u64::MAX`.
    pub fn deposit(&mut self, account: AccountId, asset: &str, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let entry = self
            .balances
            .entry((Holder::Account(account), asset.to_string()))
            .or_default();
        *entry = entry.checked_add(amount).ok_or(SwapError::AmountOverflow {
            context: "deposit",
        })?;
        Ok(())
    }

    /// Remove funds from an account to outside the system.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if the account holds less than `amount`.
    pub fn burn(&mut self, account: AccountId, asset: &str, amount: u64) -> Result<()> {
        let holder = Holder::Account(account);
        let available = self.balance(holder, asset);
        if available < amount {
            return Err(SwapError::InsufficientBalance {
                holder,
                asset: asset.to_string(),
                needed: amount,
                available,
            });
        }
        self.set(holder, asset, available - amount);
        Ok(())
    }

    /// Move `amount` of `asset` out of `from` into `to`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` holds less than `amount`.
    pub fn withdraw(&mut self, from: Holder, asset: &str, amount: u64, to: Holder) -> Result<()> {
        self.apply(&[Transfer::new(from, to, asset, amount)])
    }

    /// Apply a batch of transfers atomically.
    ///
    /// Net effects per (holder, asset) are computed first; if any holder
    /// would go negative or any balance would overflow, nothing changes.
    ///
    /// # Errors
    /// - `InsufficientBalance` if a holder cannot cover its net debit
    /// - `AmountOverflow` if a holder's net credit overflows
    pub fn apply(&mut self, transfers: &[Transfer]) -> Result<()> {
        let mut deltas: HashMap<(Holder, &str), i128> = HashMap::new();
        for t in transfers.iter().filter(|t| t.amount > 0) {
            *deltas.entry((t.from, t.asset.as_str())).or_default() -= i128::from(t.amount);
            *deltas.entry((t.to, t.asset.as_str())).or_default() += i128::from(t.amount);
        }

        let mut updates = Vec::with_capacity(deltas.len());
        for ((holder, asset), delta) in &deltas {
            let current = self.balance(*holder, asset);
            let next = i128::from(current) + delta;
            if next < 0 {
                let needed = u64::try_from(-delta).unwrap_or(u64::MAX);
                return Err(SwapError::InsufficientBalance {
                    holder: *holder,
                    asset: (*asset).to_string(),
                    needed,
                    available: current,
                });
            }
            let next = u64::try_from(next).map_err(|_| SwapError::AmountOverflow {
                context: "transfer credit",
            })?;
            updates.push((*holder, *asset, next));
        }

        for (holder, asset, next) in updates {
            self.set(holder, asset, next);
        }

        for t in transfers.iter().filter(|t| t.amount > 0) {
            tracing::trace!(
                from = %t.from,
                to = %t.to,
                asset = %t.asset,
                amount = t.amount,
                "Transfer applied"
            );
        }
        Ok(())
    }

    /// Current balance of `holder` in `asset`.
    #[must_use]
    pub fn balance(&self, holder: impl Into<Holder>, asset: &str) -> u64 {
        self.balances
            .get(&(holder.into(), asset.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// All non-zero holdings of `holder`, sorted by asset.
    #[must_use]
    pub fn holdings(&self, holder: impl Into<Holder>) -> Vec<(Asset, u64)> {
        let holder = holder.into();
        let mut out: Vec<(Asset, u64)> = self
            .balances
            .iter()
            .filter(|((h, _), _)| *h == holder)
            .map(|((_, asset), amount)| (asset.clone(), *amount))
            .collect();
        out.sort();
        out
    }

    /// Total of an asset held by anyone, accounts and objects alike.
    #[must_use]
    pub fn total_supply(&self, asset: &str) -> u128 {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| u128::from(*amount))
            .sum()
    }

    /// Total of an asset held by swap objects (in custody).
    #[must_use]
    pub fn in_custody(&self, asset: &str) -> u128 {
        self.balances
            .iter()
            .filter(|((h, a), _)| a == asset && h.is_object())
            .map(|(_, amount)| u128::from(*amount))
            .sum()
    }

    fn set(&mut self, holder: Holder, asset: &str, amount: u64) {
        if amount == 0 {
            self.balances.remove(&(holder, asset.to_string()));
        } else {
            self.balances.insert((holder, asset.to_string()), amount);
        }
    }
}
