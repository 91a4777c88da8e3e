// Configuration Domain Model

use super::duration::HumanDuration;
use super::error::{DomainError, Result};
use super::event::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of fast-path workers
pub const DEFAULT_NUM_WORKERS: usize = 8;

/// Default number of batch workers
pub const DEFAULT_NUM_BATCHES: usize = 1;

/// Default work queue capacity
pub const DEFAULT_WORK_QUEUE_LEN: usize = 100;

/// Default batch queue capacity (the slow path is the scarce resource)
pub const DEFAULT_BATCH_QUEUE_LEN: usize = 5;

/// Default long-poll timeout (120s)
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// Default event time-to-live (24h)
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Persisted configuration.
///
/// Zero or absent values mean "use the default"; see [`Config::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Working directory, never persisted
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(rename = "api_token", default)]
    pub token: String,

    #[serde(rename = "workers", default)]
    pub num_workers: usize,

    #[serde(rename = "batches", default)]
    pub num_batches: usize,

    /// Seconds
    #[serde(default)]
    pub poll_timeout: u64,

    #[serde(rename = "update_ttl", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<HumanDuration>,

    #[serde(default)]
    pub work_queue_len: usize,

    #[serde(default)]
    pub batch_queue_len: usize,

    /// Users allowed to run privileged commands
    #[serde(default)]
    pub admins: Vec<UserId>,
}

impl Config {
    /// Fill in defaults and validate, producing the read-only dispatch config
    pub fn resolve(&self) -> Result<DispatchConfig> {
        let or_default = |value: usize, default: usize| if value == 0 { default } else { value };

        let resolved = DispatchConfig {
            ttl: self.ttl.map(|t| t.as_duration()).unwrap_or(DEFAULT_TTL),
            num_workers: or_default(self.num_workers, DEFAULT_NUM_WORKERS),
            num_batches: or_default(self.num_batches, DEFAULT_NUM_BATCHES),
            poll_timeout: if self.poll_timeout == 0 {
                DEFAULT_POLL_TIMEOUT
            } else {
                Duration::from_secs(self.poll_timeout)
            },
            work_queue_len: or_default(self.work_queue_len, DEFAULT_WORK_QUEUE_LEN),
            batch_queue_len: or_default(self.batch_queue_len, DEFAULT_BATCH_QUEUE_LEN),
            admins: self.admins.iter().copied().collect(),
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

/// Process-wide dispatch settings. Read-only once the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub ttl: Duration,
    pub num_workers: usize,
    pub num_batches: usize,
    pub poll_timeout: Duration,
    pub work_queue_len: usize,
    pub batch_queue_len: usize,
    pub admins: HashSet<UserId>,
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 || self.num_batches == 0 {
            return Err(DomainError::InvalidConfig(
                "worker pools need at least one worker".to_string(),
            ));
        }
        if self.work_queue_len == 0 || self.batch_queue_len == 0 {
            return Err(DomainError::InvalidConfig(
                "queue capacities must be at least 1".to_string(),
            ));
        }
        if self.batch_queue_len > self.work_queue_len {
            return Err(DomainError::InvalidConfig(format!(
                "batch queue ({}) must not be larger than work queue ({})",
                self.batch_queue_len, self.work_queue_len
            )));
        }
        Ok(())
    }

    pub fn is_admin(&self, user: Option<UserId>) -> bool {
        user.is_some_and(|u| self.admins.contains(&u))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            num_workers: DEFAULT_NUM_WORKERS,
            num_batches: DEFAULT_NUM_BATCHES,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            work_queue_len: DEFAULT_WORK_QUEUE_LEN,
            batch_queue_len: DEFAULT_BATCH_QUEUE_LEN,
            admins: HashSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_applies_defaults() {
        let resolved = Config::default().resolve().unwrap();
        assert_eq!(resolved, DispatchConfig::default());
    }

    #[test]
    fn test_resolve_keeps_explicit_values() {
        let config = Config {
            num_workers: 2,
            num_batches: 3,
            poll_timeout: 5,
            ttl: Some(HumanDuration::new(Duration::from_secs(60))),
            work_queue_len: 10,
            batch_queue_len: 1,
            admins: vec![7],
            ..Default::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.num_workers, 2);
        assert_eq!(resolved.num_batches, 3);
        assert_eq!(resolved.poll_timeout, Duration::from_secs(5));
        assert_eq!(resolved.ttl, Duration::from_secs(60));
        assert_eq!(resolved.batch_queue_len, 1);
        assert!(resolved.is_admin(Some(7)));
        assert!(!resolved.is_admin(Some(8)));
        assert!(!resolved.is_admin(None));
    }

    #[test]
    fn test_batch_queue_larger_than_work_queue_is_rejected() {
        let config = Config {
            work_queue_len: 2,
            batch_queue_len: 3,
            ..Default::default()
        };
        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("batch queue"));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::json!({
            "api_token": "secret",
            "workers": 4,
            "batches": 2,
            "poll_timeout": 30,
            "update_ttl": "1h",
        });
        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.token, "secret");
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.num_batches, 2);
        assert_eq!(config.ttl.unwrap().as_duration(), Duration::from_secs(3600));
        assert!(config.admins.is_empty());
    }
}
