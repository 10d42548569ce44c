use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use crate::Result;

/// Health discovery behaviour: how often each connected proxy is
/// reconciled and what the generated probes look like by default.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HdsConfig {
    /// When false the process exits right after loading configuration
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Period of the per-proxy reconcile tick
    #[serde(default = "default_interval_in_ms")]
    pub interval_in_ms: u64,

    /// How often proxies are asked to report endpoint health
    #[serde(default = "default_report_interval_in_ms")]
    pub report_interval_in_ms: u64,

    /// Defaults for generated probes, overridable per inbound
    #[serde(default)]
    pub check: CheckConfig,
}

/// Probe parameters applied to every generated health check
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CheckConfig {
    #[serde(default = "default_check_timeout_in_ms")]
    pub timeout_in_ms: u64,

    #[serde(default = "default_check_interval_in_ms")]
    pub interval_in_ms: u64,

    #[serde(default = "default_no_traffic_interval_in_ms")]
    pub no_traffic_interval_in_ms: u64,

    #[serde(default = "default_threshold")]
    pub healthy_threshold: u32,

    #[serde(default = "default_threshold")]
    pub unhealthy_threshold: u32,
}

impl Default for HdsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_in_ms: default_interval_in_ms(),
            report_interval_in_ms: default_report_interval_in_ms(),
            check: CheckConfig::default(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout_in_ms: default_check_timeout_in_ms(),
            interval_in_ms: default_check_interval_in_ms(),
            no_traffic_interval_in_ms: default_no_traffic_interval_in_ms(),
            healthy_threshold: default_threshold(),
            unhealthy_threshold: default_threshold(),
        }
    }
}

impl HdsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_in_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_in_ms == 0 {
            return Err(config_error("hds.interval_in_ms must be > 0"));
        }
        if self.report_interval_in_ms == 0 {
            return Err(config_error("hds.report_interval_in_ms must be > 0"));
        }
        self.check.validate()
    }
}

impl CheckConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval_in_ms == 0 || self.no_traffic_interval_in_ms == 0 {
            return Err(config_error("hds.check intervals must be > 0"));
        }
        if self.timeout_in_ms == 0 {
            return Err(config_error("hds.check.timeout_in_ms must be > 0"));
        }
        if self.healthy_threshold == 0 || self.unhealthy_threshold == 0 {
            return Err(config_error("hds.check thresholds must be >= 1"));
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}
fn default_interval_in_ms() -> u64 {
    10_000
}
fn default_report_interval_in_ms() -> u64 {
    5_000
}
fn default_check_timeout_in_ms() -> u64 {
    2_000
}
fn default_check_interval_in_ms() -> u64 {
    1_000
}
fn default_no_traffic_interval_in_ms() -> u64 {
    1_000
}
fn default_threshold() -> u32 {
    1
}
