//! Tailer configuration.
//!
//! Every field has a default tuned for a 60Hz game writing to local disk, so most callers
//! only use [`LiveConfig::default`]. Configuration can also be loaded from YAML:
//!
//! ```rust
//! use slippi_live::LiveConfig;
//!
//! let config = LiveConfig::from_yaml_str("poll_interval_ms: 8\nmax_io_retries: 3\n")?;
//! assert_eq!(config.poll_interval_ms, 8);
//! assert_eq!(config.max_poll_interval_ms, 250);
//! # Ok::<(), slippi_live::LiveError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{LiveError, Result};

/// Configuration for a live tailing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveConfig {
    /// First delay after a re-read that found no new bytes.
    pub poll_interval_ms: u64,

    /// Upper bound for the doubling re-read delay.
    pub max_poll_interval_ms: u64,

    /// How long to wait for the game to write the header; `None` waits forever.
    ///
    /// A session is usually started from the menus, well before the game creates the replay,
    /// so the default is `None`.
    pub bootstrap_timeout_ms: Option<u64>,

    /// Consecutive transient I/O failures tolerated before the session fails.
    pub max_io_retries: u32,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16,
            max_poll_interval_ms: 250,
            bootstrap_timeout_ms: None,
            max_io_retries: 10,
        }
    }
}

impl LiveConfig {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LiveConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LiveError::config(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the intervals are usable.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(LiveError::config("poll_interval_ms must be greater than zero"));
        }

        if self.max_poll_interval_ms < self.poll_interval_ms {
            return Err(LiveError::config(format!(
                "max_poll_interval_ms ({}) is below poll_interval_ms ({})",
                self.max_poll_interval_ms, self.poll_interval_ms
            )));
        }

        if self.bootstrap_timeout_ms == Some(0) {
            return Err(LiveError::config("bootstrap_timeout_ms must be greater than zero"));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    pub fn bootstrap_timeout(&self) -> Option<Duration> {
        self.bootstrap_timeout_ms.map(Duration::from_millis)
    }
}
