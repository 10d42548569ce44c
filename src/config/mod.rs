//! Configuration management for the health discovery control plane.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`HDS__` prefix, `__` separator)
//! - Component-wise validation

mod authn;
mod hds;
mod monitoring;
mod retry;
mod server;
mod tls;
pub use authn::*;
pub use hds::*;
pub use monitoring::*;
pub use retry::*;
pub use server::*;
pub use tls::*;

#[cfg(test)]
mod config_test;

use std::env;
use std::fmt::Debug;
use std::path::PathBuf;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

const ENV_PREFIX: &str = "HDS";

/// Main configuration container for the health discovery subsystem
///
/// Combines all component configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct HdsNodeConfig {
    /// gRPC listener parameters
    #[serde(default)]
    pub server: ServerConfig,
    /// Reconcile loop and generated probe parameters
    #[serde(default)]
    pub hds: HdsConfig,
    /// Credential verification per proxy kind
    #[serde(default)]
    pub authn: AuthnConfig,
    /// Retry policies
    #[serde(default)]
    pub retry: RetryPolicies,
    /// Metrics endpoint
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// TLS for the gRPC listener
    #[serde(default)]
    pub tls: TlsConfig,
    /// In-memory topology store seeding
    #[serde(default)]
    pub store: StoreConfig,
    /// Directory the binary writes its log file into
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Debug for HdsNodeConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("HdsNodeConfig")
            .field("server", &self.server)
            .field("hds", &self.hds)
            .field("monitoring", &self.monitoring)
            .finish_non_exhaustive()
    }
}

impl HdsNodeConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `HDS__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so callers can apply `with_override_config()` first.
    /// Callers MUST call `validate()` before using the configuration.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("HDS__HDS__INTERVAL_IN_MS", "5000");
    /// let cfg = HdsNodeConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    pub fn validate(self) -> Result<Self> {
        self.server.validate()?;
        self.hds.validate()?;
        self.authn.validate()?;
        self.retry.validate()?;
        self.monitoring.validate()?;
        self.tls.validate()?;
        Ok(self)
    }
}

fn environment_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

/// Seeding of the in-memory topology store for standalone runs.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// TOML file with `[[dataplane]]` records loaded at startup
    #[serde(default)]
    pub bootstrap_path: Option<PathBuf>,
}

pub(crate) fn config_error(msg: impl Into<String>) -> Error {
    Error::Config(ConfigError::Message(msg.into()))
}
