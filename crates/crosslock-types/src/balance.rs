//! Holders of balances in the asset store.
//!
//! Funds live either in an externally owned account or inside one of the
//! swap objects. An object exclusively owns whatever is credited to it
//! until it disburses it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AccountId, AuctionId, EscrowId, FusionOrderId};

/// Type alias for asset identifiers (e.g., "USDC", "WETH", "SUI").
pub type Asset = String;

/// Anything that can hold a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Holder {
    Account(AccountId),
    Auction(AuctionId),
    FusionOrder(FusionOrderId),
    Escrow(EscrowId),
}

impl Holder {
    /// Whether this holder is a swap object rather than an account.
    #[must_use]
    pub fn is_object(&self) -> bool {
        !matches!(self, Self::Account(_))
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => write!(f, "{id}"),
            Self::Auction(id) => write!(f, "{id}"),
            Self::FusionOrder(id) => write!(f, "{id}"),
            Self::Escrow(id) => write!(f, "{id}"),
        }
    }
}

impl From<AccountId> for Holder {
    fn from(id: AccountId) -> Self {
        Self::Account(id)
    }
}

impl From<AuctionId> for Holder {
    fn from(id: AuctionId) -> Self {
        Self::Auction(id)
    }
}

impl From<FusionOrderId> for Holder {
    fn from(id: FusionOrderId) -> Self {
        Self::FusionOrder(id)
    }
}

impl From<EscrowId> for Holder {
    fn from(id: EscrowId) -> Self {
        Self::Escrow(id)
    }
}
