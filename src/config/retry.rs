use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use crate::Result;

/// Basic retry policy template
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Maximum number of retries (0 means unlimited retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Single operation timeout (unit: milliseconds)
    #[serde(default = "default_op_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Retry strategies by call site
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryPolicies {
    /// Proxy record lookup during stream authentication. The record may
    /// not be visible yet when the proxy connects right after registering.
    #[serde(default)]
    pub authentication: BackoffPolicy,
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            authentication: BackoffPolicy {
                max_retries: 5,
                timeout_ms: 1000,
                base_delay_ms: 100,
                max_delay_ms: 2000,
            },
        }
    }
}

impl RetryPolicies {
    pub fn validate(&self) -> Result<()> {
        let policy = &self.authentication;
        if policy.timeout_ms == 0 {
            return Err(config_error("retry.authentication.timeout_ms must be > 0"));
        }
        if policy.base_delay_ms > policy.max_delay_ms {
            return Err(config_error(format!(
                "retry.authentication.base_delay_ms {} exceeds max_delay_ms {}",
                policy.base_delay_ms, policy.max_delay_ms
            )));
        }
        Ok(())
    }
}

fn default_max_retries() -> usize {
    3
}
fn default_op_timeout_ms() -> u64 {
    100
}
fn default_base_delay_ms() -> u64 {
    50
}
fn default_max_delay_ms() -> u64 {
    1000
}
