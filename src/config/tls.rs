use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TlsConfig {
    /// Enables TLS on the discovery listener
    /// Default: false (plaintext)
    #[serde(default = "default_enable_tls")]
    pub enable_tls: bool,

    /// Server certificate chain path in PEM format
    /// Default: "./certs/server.pem"
    #[serde(default = "default_server_cert_path")]
    pub server_certificate_path: String,

    /// Server private key path in PEM format
    /// Default: "./certs/server.key"
    #[serde(default = "default_server_key_path")]
    pub server_private_key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enable_tls: default_enable_tls(),
            server_certificate_path: default_server_cert_path(),
            server_private_key_path: default_server_key_path(),
        }
    }
}

impl TlsConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.enable_tls {
            return Ok(());
        }
        for (field, path) in [
            ("server_certificate_path", &self.server_certificate_path),
            ("server_private_key_path", &self.server_private_key_path),
        ] {
            if path.is_empty() {
                return Err(config_error(format!("tls.{field} is required when TLS is enabled")));
            }
            if !Path::new(path).exists() {
                return Err(config_error(format!("tls.{field} {path} does not exist")));
            }
        }
        Ok(())
    }
}

fn default_enable_tls() -> bool {
    false
}
fn default_server_cert_path() -> String {
    "./certs/server.pem".into()
}
fn default_server_key_path() -> String {
    "./certs/server.key".into()
}
