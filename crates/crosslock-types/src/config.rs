//! Configuration for a crosslock ledger.

use serde::{Deserialize, Serialize};

use crate::{Result, SwapError, Timelock, Timestamp, constants};

/// Phase durations stamped onto every escrow created by a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockConfig {
    /// Seconds before anyone may act (source-chain finality).
    pub finality_duration: u64,
    /// Seconds during which only the taker may withdraw.
    pub exclusive_withdrawal_duration: u64,
    /// Seconds during which anyone may withdraw with the secret.
    pub public_withdrawal_duration: u64,
    /// Seconds during which only the taker may recover.
    pub private_cancellation_duration: u64,
}

impl Default for TimelockConfig {
    fn default() -> Self {
        Self {
            finality_duration: constants::DEFAULT_FINALITY_SECS,
            exclusive_withdrawal_duration: constants::DEFAULT_EXCLUSIVE_WITHDRAWAL_SECS,
            public_withdrawal_duration: constants::DEFAULT_PUBLIC_WITHDRAWAL_SECS,
            private_cancellation_duration: constants::DEFAULT_PRIVATE_CANCELLATION_SECS,
        }
    }
}

impl TimelockConfig {
    /// Reject all-zero durations and any single duration above
    /// [`constants::MAX_PHASE_DURATION_SECS`].
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("finality", self.finality_duration),
            ("exclusive_withdrawal", self.exclusive_withdrawal_duration),
            ("public_withdrawal", self.public_withdrawal_duration),
            ("private_cancellation", self.private_cancellation_duration),
        ];
        if durations.iter().all(|(_, d)| *d == 0) {
            return Err(SwapError::Configuration(
                "timelock durations must not all be zero".into(),
            ));
        }
        if let Some((name, d)) = durations
            .iter()
            .find(|(_, d)| *d > constants::MAX_PHASE_DURATION_SECS)
        {
            return Err(SwapError::Configuration(format!(
                "{name} duration {d}s exceeds maximum {}s",
                constants::MAX_PHASE_DURATION_SECS
            )));
        }
        Ok(())
    }

    /// A fresh timelock starting at `created_at`.
    #[must_use]
    pub fn start_at(&self, created_at: Timestamp) -> Timelock {
        Timelock::new(
            created_at,
            self.finality_duration,
            self.exclusive_withdrawal_duration,
            self.public_withdrawal_duration,
            self.private_cancellation_duration,
        )
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Escrow phase durations.
    #[serde(default)]
    pub timelock: TimelockConfig,
    /// Asset in which safety deposits are posted.
    #[serde(default = "default_native_asset")]
    pub native_asset: String,
    /// Largest number of fill segments accepted on one order.
    #[serde(default = "default_max_segments")]
    pub max_segments: u32,
}

fn default_native_asset() -> String {
    constants::DEFAULT_NATIVE_ASSET.to_string()
}

fn default_max_segments() -> u32 {
    constants::DEFAULT_MAX_SEGMENTS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timelock: TimelockConfig::default(),
            native_asset: default_native_asset(),
            max_segments: default_max_segments(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.timelock.validate()?;
        if self.native_asset.trim().is_empty() {
            return Err(SwapError::Configuration(
                "native_asset must not be empty".into(),
            ));
        }
        if self.max_segments == 0 {
            return Err(SwapError::Configuration(
                "max_segments must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
