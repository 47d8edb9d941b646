//! Engine tuning knobs, embedded in the daemon's TOML configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the access engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// How long a scan waits for another in-flight scan of the same person
    /// before failing with a contention error.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    2_000
}

impl AccessConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_uses_defaults() {
        let config: AccessConfig = toml::from_str("").unwrap();
        assert_eq!(config, AccessConfig::default());
        assert_eq!(config.lock_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn timeout_override() {
        let config: AccessConfig = toml::from_str("lock_timeout_ms = 50").unwrap();
        assert_eq!(config.lock_timeout(), Duration::from_millis(50));
    }
}
