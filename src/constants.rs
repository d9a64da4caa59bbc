//! # System Constants
//!
//! Operational defaults for the background core. Everything here can be
//! overridden through [`crate::config::CentaureaConfig`]; these are the values
//! the system runs with when nothing else is configured.

/// Default operational values.
pub mod defaults {
    /// Maximum events drained per executor cycle.
    pub const BATCH_SIZE: usize = 10;

    /// Pause between executor cycles once a batch has settled.
    pub const CYCLE_DELAY_SECS: u64 = 1;

    /// Bound on how long a producer blocks in `enqueue_awaiting`.
    pub const SYNC_WAIT_TIMEOUT_SECS: u64 = 5;

    /// Upper bound on the delay scheduler's sleep between heap checks.
    pub const DELAYED_POLL_INTERVAL_SECS: u64 = 1;

    /// Bound on how long `BackgroundExecutor::stop` waits for drain.
    pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

    /// Regexp calculations allowed per user per calendar day.
    pub const REGEXP_DAILY_LIMIT: u32 = 5;
}

/// Environment variable names recognized by `CentaureaConfig::from_env`.
pub mod env {
    pub const BATCH_SIZE: &str = "CENTAUREA_BATCH_SIZE";
    pub const CYCLE_DELAY_MS: &str = "CENTAUREA_CYCLE_DELAY_MS";
    pub const SYNC_WAIT_TIMEOUT_MS: &str = "CENTAUREA_SYNC_WAIT_TIMEOUT_MS";
    pub const DELAYED_POLL_INTERVAL_MS: &str = "CENTAUREA_DELAYED_POLL_INTERVAL_MS";
    pub const SHUTDOWN_TIMEOUT_MS: &str = "CENTAUREA_SHUTDOWN_TIMEOUT_MS";
    pub const REGEXP_DAILY_LIMIT: &str = "CENTAUREA_REGEXP_DAILY_LIMIT";
}
