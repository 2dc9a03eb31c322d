//! Region ticking configuration.
//!
//! ```json
//! {
//!   "enable": true,
//!   "executor-thread-count": 4,
//!   "shutdown-timeout-secs": 10
//! }
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Worker count used when the configured one is out of range.
pub const DEFAULT_THREAD_COUNT: usize = 4;
/// Largest accepted worker count.
pub const MAX_THREAD_COUNT: usize = 10;

/// Static configuration for regionized ticking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegionTickingConfig {
    /// Tick disjoint regions in parallel. When false every chunk and entity
    /// is ticked sequentially on the calling thread.
    pub enable: bool,
    /// Number of region worker threads (1..=10).
    pub executor_thread_count: usize,
    /// How long shutdown waits for workers to exit.
    pub shutdown_timeout_secs: u64,
}

impl Default for RegionTickingConfig {
    fn default() -> Self {
        Self {
            enable: true,
            executor_thread_count: DEFAULT_THREAD_COUNT,
            shutdown_timeout_secs: 10,
        }
    }
}

impl RegionTickingConfig {
    /// Reset out-of-range values to their defaults.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if !(1..=MAX_THREAD_COUNT).contains(&self.executor_thread_count) {
            warn!(
                "Invalid regionized chunk ticking thread count: {}, resetting to default ({})",
                self.executor_thread_count, DEFAULT_THREAD_COUNT
            );
            self.executor_thread_count = DEFAULT_THREAD_COUNT;
        }
        self
    }

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Per-world values read at the start of every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSettings {
    /// Radius, in chunks, of the window each player keeps ticking.
    pub tick_view_distance: u32,
    /// Passed through to every chunk tick.
    pub random_tick_speed: u32,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            tick_view_distance: 10,
            random_tick_speed: 3,
        }
    }
}

impl TickSettings {
    #[must_use]
    pub const fn new(tick_view_distance: u32, random_tick_speed: u32) -> Self {
        Self {
            tick_view_distance,
            random_tick_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: RegionTickingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RegionTickingConfig::default());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_kebab_case_keys() {
        let config: RegionTickingConfig = serde_json::from_str(
            r#"{ "enable": false, "executor-thread-count": 2, "shutdown-timeout-secs": 3 }"#,
        )
        .unwrap();

        assert!(!config.enable);
        assert_eq!(config.executor_thread_count, 2);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result =
            serde_json::from_str::<RegionTickingConfig>(r#"{ "executor-thread-priority": 7 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_thread_count_out_of_range_resets() {
        for bad in [0, 11, 64] {
            let config = RegionTickingConfig {
                executor_thread_count: bad,
                ..Default::default()
            }
            .validated();
            assert_eq!(config.executor_thread_count, DEFAULT_THREAD_COUNT);
        }

        let config = RegionTickingConfig {
            executor_thread_count: 10,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.executor_thread_count, 10);
    }
}
