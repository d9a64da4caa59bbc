//! # Configuration
//!
//! Process-level configuration for the background core, assembled by the
//! composition root and handed to the queue and executor at construction.
//! Defaults come from [`crate::constants::defaults`]; every value can be
//! overridden through environment variables (see [`crate::constants::env`]).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, env};
use crate::error::{CentaureaError, Result};
use crate::executor::ExecutorConfig;
use crate::queue::QueueConfig;

/// Root configuration for the background core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentaureaConfig {
    /// Maximum events drained per executor cycle.
    pub batch_size: usize,
    /// Pause between executor cycles, in milliseconds.
    pub cycle_delay_ms: u64,
    /// Producer-side wait bound for `enqueue_awaiting`, in milliseconds.
    pub sync_wait_timeout_ms: u64,
    /// Delay-scheduler poll bound, in milliseconds.
    pub delayed_poll_interval_ms: u64,
    /// Executor shutdown drain bound, in milliseconds.
    pub shutdown_timeout_ms: u64,
    /// Regexp calculations allowed per user per day.
    pub regexp_daily_limit: u32,
}

impl Default for CentaureaConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            cycle_delay_ms: defaults::CYCLE_DELAY_SECS * 1000,
            sync_wait_timeout_ms: defaults::SYNC_WAIT_TIMEOUT_SECS * 1000,
            delayed_poll_interval_ms: defaults::DELAYED_POLL_INTERVAL_SECS * 1000,
            shutdown_timeout_ms: defaults::SHUTDOWN_TIMEOUT_SECS * 1000,
            regexp_daily_limit: defaults::REGEXP_DAILY_LIMIT,
        }
    }
}

impl CentaureaConfig {
    /// Build a configuration from defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = read_env(env::BATCH_SIZE)? {
            config.batch_size = value as usize;
        }
        if let Some(value) = read_env(env::CYCLE_DELAY_MS)? {
            config.cycle_delay_ms = value;
        }
        if let Some(value) = read_env(env::SYNC_WAIT_TIMEOUT_MS)? {
            config.sync_wait_timeout_ms = value;
        }
        if let Some(value) = read_env(env::DELAYED_POLL_INTERVAL_MS)? {
            config.delayed_poll_interval_ms = value;
        }
        if let Some(value) = read_env(env::SHUTDOWN_TIMEOUT_MS)? {
            config.shutdown_timeout_ms = value;
        }
        if let Some(value) = read_env(env::REGEXP_DAILY_LIMIT)? {
            config.regexp_daily_limit = value as u32;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(CentaureaError::ConfigurationError(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.sync_wait_timeout_ms == 0 {
            return Err(CentaureaError::ConfigurationError(
                "sync_wait_timeout_ms must be positive".to_string(),
            ));
        }
        if self.delayed_poll_interval_ms == 0 {
            return Err(CentaureaError::ConfigurationError(
                "delayed_poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            delayed_poll_interval: Duration::from_millis(self.delayed_poll_interval_ms),
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            batch_size: self.batch_size,
            cycle_delay: Duration::from_millis(self.cycle_delay_ms),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
        }
    }

    /// The producer-side wait bound as a `Duration`.
    pub fn sync_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_wait_timeout_ms)
    }
}

fn read_env(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| CentaureaError::ConfigurationError(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CentaureaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.sync_wait_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = CentaureaConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CentaureaError::ConfigurationError(_))
        ));
    }

    #[test]
    fn derived_configs_carry_the_configured_values() {
        let config = CentaureaConfig {
            batch_size: 3,
            cycle_delay_ms: 50,
            delayed_poll_interval_ms: 25,
            ..Default::default()
        };
        assert_eq!(config.executor_config().batch_size, 3);
        assert_eq!(
            config.executor_config().cycle_delay,
            Duration::from_millis(50)
        );
        assert_eq!(
            config.queue_config().delayed_poll_interval,
            Duration::from_millis(25)
        );
    }
}
