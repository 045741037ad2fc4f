//! Escrow timelock: a five-phase clock derived from a creation timestamp.
//!
//! ```text
//!  created_at
//!      │ finality │ exclusive wd │ public wd │ private cancel │ public cancel ──▶
//!      └────d1────┴──────d2──────┴─────d3────┴───────d4───────┘
//! ```
//!
//! Phases are contiguous and non-overlapping. The phase is never stored:
//! it is recomputed from `(created_at, durations, now)` on every query, so
//! there is no state that can drift from the wall clock.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// The five ordered phases of an escrow timelock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the counterpart chain to reach finality. Nothing allowed.
    Finality,
    /// Only the escrow taker may withdraw.
    ExclusiveWithdrawal,
    /// Anyone holding the secret may withdraw.
    PublicWithdrawal,
    /// Only the escrow taker may recover.
    PrivateCancellation,
    /// Anyone may recover. Terminal.
    PublicCancellation,
}

impl Phase {
    /// All phases in order.
    pub const ALL: [Self; 5] = [
        Self::Finality,
        Self::ExclusiveWithdrawal,
        Self::PublicWithdrawal,
        Self::PrivateCancellation,
        Self::PublicCancellation,
    ];

    /// The following phase. Public cancellation is terminal and maps to itself.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Finality => Self::ExclusiveWithdrawal,
            Self::ExclusiveWithdrawal => Self::PublicWithdrawal,
            Self::PublicWithdrawal => Self::PrivateCancellation,
            Self::PrivateCancellation | Self::PublicCancellation => Self::PublicCancellation,
        }
    }

    /// Whether `withdraw` may be called in this phase.
    #[must_use]
    pub fn allows_withdraw(self) -> bool {
        matches!(self, Self::ExclusiveWithdrawal | Self::PublicWithdrawal)
    }

    /// Whether `recovery` may be called in this phase.
    #[must_use]
    pub fn allows_recovery(self) -> bool {
        matches!(self, Self::PrivateCancellation | Self::PublicCancellation)
    }

    /// Whether only the escrow taker may act in this phase.
    #[must_use]
    pub fn is_taker_only(self) -> bool {
        matches!(self, Self::ExclusiveWithdrawal | Self::PrivateCancellation)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finality => write!(f, "FINALITY"),
            Self::ExclusiveWithdrawal => write!(f, "EXCLUSIVE_WITHDRAWAL"),
            Self::PublicWithdrawal => write!(f, "PUBLIC_WITHDRAWAL"),
            Self::PrivateCancellation => write!(f, "PRIVATE_CANCELLATION"),
            Self::PublicCancellation => write!(f, "PUBLIC_CANCELLATION"),
        }
    }
}

/// An immutable phase clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timelock {
    created_at: Timestamp,
    finality_duration: u64,
    exclusive_withdrawal_duration: u64,
    public_withdrawal_duration: u64,
    private_cancellation_duration: u64,
}

impl Timelock {
    /// Start a clock at `created_at` with the four bounded phase durations.
    ///
    /// Durations are free-form; sanity limits are applied by the caller
    /// (see [`TimelockConfig::validate`](crate::TimelockConfig::validate)).
    #[must_use]
    pub fn new(
        created_at: Timestamp,
        finality_duration: u64,
        exclusive_withdrawal_duration: u64,
        public_withdrawal_duration: u64,
        private_cancellation_duration: u64,
    ) -> Self {
        Self {
            created_at,
            finality_duration,
            exclusive_withdrawal_duration,
            public_withdrawal_duration,
            private_cancellation_duration,
        }
    }

    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// `(finality, exclusive withdrawal, public withdrawal, private cancellation)`.
    #[must_use]
    pub fn durations(&self) -> (u64, u64, u64, u64) {
        (
            self.finality_duration,
            self.exclusive_withdrawal_duration,
            self.public_withdrawal_duration,
            self.private_cancellation_duration,
        )
    }

    /// First instant of `phase`. Saturates at `u64::MAX`.
    #[must_use]
    pub fn phase_start(&self, phase: Phase) -> Timestamp {
        let offsets = [
            0,
            self.finality_duration,
            self.exclusive_withdrawal_duration,
            self.public_withdrawal_duration,
            self.private_cancellation_duration,
        ];
        let idx = Phase::ALL
            .iter()
            .position(|p| *p == phase)
            .unwrap_or(Phase::ALL.len() - 1);
        offsets[..=idx]
            .iter()
            .fold(self.created_at, |acc, d| acc.saturating_add(*d))
    }

    /// First instant after `phase`, or `None` for the unbounded terminal phase.
    #[must_use]
    pub fn phase_end(&self, phase: Phase) -> Option<Timestamp> {
        match phase {
            Phase::PublicCancellation => None,
            other => Some(self.phase_start(other.next())),
        }
    }

    /// The phase `now` falls in. Times before `created_at` report Finality.
    #[must_use]
    pub fn current_phase(&self, now: Timestamp) -> Phase {
        Phase::ALL[1..]
            .iter()
            .rev()
            .find(|phase| now >= self.phase_start(**phase))
            .copied()
            .unwrap_or(Phase::Finality)
    }
}
