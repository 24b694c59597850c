//! Refresh intervals.

use std::time::Duration;

/// Polling interval of one synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    pub interval_ms: u64,
}

impl RefreshConfig {
    pub const fn every(interval_ms: u64) -> Self {
        Self { interval_ms }
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self::every(5_000)
    }
}

/// Intervals for every collection mirrored from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub outputs: RefreshConfig,
    pub output_status: RefreshConfig,
    pub inputs: RefreshConfig,
    pub group_actions: RefreshConfig,
    pub pulse_counters: RefreshConfig,
    pub apps: RefreshConfig,
    pub app_logs: RefreshConfig,
}

impl SyncConfig {
    /// Every collection at the same interval.
    pub const fn uniform(interval_ms: u64) -> Self {
        let every = RefreshConfig::every(interval_ms);
        Self {
            outputs: every,
            output_status: every,
            inputs: every,
            group_actions: every,
            pulse_counters: every,
            apps: every,
            app_logs: every,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            outputs: RefreshConfig::every(5_000),
            output_status: RefreshConfig::every(5_000),
            inputs: RefreshConfig::every(5_000),
            group_actions: RefreshConfig::every(10_000),
            pulse_counters: RefreshConfig::every(30_000),
            apps: RefreshConfig::every(60_000),
            app_logs: RefreshConfig::every(1_000),
        }
    }
}
