//! Configuration for the GPU scheduler kernel.
//!
//! Externalizes the constants spec.md treats as fixed (lock annotation key,
//! expiry threshold, retry count/delay) so an operator can tune them without
//! a rebuild, following the teacher's struct-of-structs `Config` pattern.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level scheduler kernel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub lock: LockConfig,
    pub scoring: ScoringConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock: LockConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from a TOML document.
    pub fn from_toml(s: &str) -> crate::error::Result<Self> {
        toml::from_str(s).map_err(|e| crate::error::Error::Config {
            message: e.to_string(),
        })
    }
}

/// Node advisory lock tuning (component F of the specification).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Annotation key the lock's timestamp is stored under.
    pub annotation_key: String,
    /// A lock older than this is considered expired and may be reclaimed.
    pub expiry: Duration,
    /// Number of update retries before giving up with `retry-exhausted`.
    pub max_retries: u32,
    /// Delay between retries.
    pub retry_delay: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            annotation_key: "mutex.lock".to_string(),
            expiry: Duration::from_secs(5 * 60),
            max_retries: 5,
            retry_delay: Duration::from_millis(100),
        }
    }
}

/// Scoring tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Value substituted for `total/free` when a node's accumulated `free`
    /// is zero (see DESIGN.md's Open Question decision).
    pub zero_free_ratio: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            zero_free_ratio: f64::MAX / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.lock.annotation_key, "mutex.lock");
        assert_eq!(cfg.lock.expiry, Duration::from_secs(300));
        assert_eq!(cfg.lock.max_retries, 5);
        assert_eq!(cfg.lock.retry_delay, Duration::from_millis(100));
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = Config::default();
        let s = toml::to_string(&cfg).expect("serializable");
        let parsed = Config::from_toml(&s).expect("parseable");
        assert_eq!(parsed.lock.annotation_key, cfg.lock.annotation_key);
        assert_eq!(parsed.lock.max_retries, cfg.lock.max_retries);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(Config::from_toml("not valid = [ toml").is_err());
    }
}
