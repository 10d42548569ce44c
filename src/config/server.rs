use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use crate::Result;

/// Listener parameters of the discovery gRPC server
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the HealthDiscoveryService binds to
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,

    /// Capacity of the per-stream inbound and outbound channels
    #[serde(default = "default_stream_buffer_size")]
    pub stream_buffer_size: usize,

    /// Max concurrent requests per connection
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// TCP keepalive in seconds
    #[serde(default = "default_tcp_keepalive")]
    pub tcp_keepalive_in_secs: u64,

    /// HTTP2 keepalive ping interval in seconds
    #[serde(default = "default_h2_keepalive_interval")]
    pub http2_keep_alive_interval_in_secs: u64,

    /// HTTP2 keepalive timeout in seconds
    #[serde(default = "default_h2_keepalive_timeout")]
    pub http2_keep_alive_timeout_in_secs: u64,

    #[serde(default = "default_tcp_nodelay")]
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            stream_buffer_size: default_stream_buffer_size(),
            concurrency_limit: default_concurrency_limit(),
            tcp_keepalive_in_secs: default_tcp_keepalive(),
            http2_keep_alive_interval_in_secs: default_h2_keepalive_interval(),
            http2_keep_alive_timeout_in_secs: default_h2_keepalive_timeout(),
            tcp_nodelay: default_tcp_nodelay(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stream_buffer_size == 0 {
            return Err(config_error("server.stream_buffer_size must be > 0"));
        }
        if self.concurrency_limit == 0 {
            return Err(config_error("server.concurrency_limit must be > 0"));
        }
        if self.http2_keep_alive_timeout_in_secs >= self.http2_keep_alive_interval_in_secs {
            return Err(config_error(format!(
                "server keepalive timeout {}s must be < interval {}s",
                self.http2_keep_alive_timeout_in_secs, self.http2_keep_alive_interval_in_secs
            )));
        }
        Ok(())
    }
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5682))
}
fn default_stream_buffer_size() -> usize {
    16
}
fn default_concurrency_limit() -> usize {
    1024
}
fn default_tcp_keepalive() -> u64 {
    300
}
fn default_h2_keepalive_interval() -> u64 {
    30
}
fn default_h2_keepalive_timeout() -> u64 {
    5
}
fn default_tcp_nodelay() -> bool {
    true
}
