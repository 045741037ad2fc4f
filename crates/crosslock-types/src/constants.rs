//! System-wide constants for the crosslock swap engine.

/// Default finality phase length (seconds).
pub const DEFAULT_FINALITY_SECS: u64 = 12;

/// Default exclusive withdrawal phase length (seconds).
pub const DEFAULT_EXCLUSIVE_WITHDRAWAL_SECS: u64 = 120;

/// Default public withdrawal phase length (seconds).
pub const DEFAULT_PUBLIC_WITHDRAWAL_SECS: u64 = 600;

/// Default private cancellation phase length (seconds).
pub const DEFAULT_PRIVATE_CANCELLATION_SECS: u64 = 1800;

/// Upper bound on any single configured phase (30 days).
pub const MAX_PHASE_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Asset used for safety deposits when none is configured.
pub const DEFAULT_NATIVE_ASSET: &str = "SUI";

/// Largest number of fill segments accepted on one order.
pub const DEFAULT_MAX_SEGMENTS: u32 = 1024;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "crosslock";
