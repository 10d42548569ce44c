//! HDS gRPC surface.
//!
//! [`ProtocolServer`] owns the per-stream loop, [`HdsService`] adapts it to
//! the generated tonic trait and [`start_rpc_server`] serves it next to the
//! standard gRPC health service.

mod protocol;
mod service;
pub use protocol::*;
pub use service::*;

#[cfg(test)]
mod protocol_test;

use std::time::Duration;

use futures::FutureExt;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tonic::codec::CompressionEncoding;
use tonic::transport::server::TcpIncoming;
use tonic::transport::Identity;
use tonic::transport::ServerTlsConfig;
use tonic_health::server::health_reporter;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::proto::hds::health_discovery_service_server::HealthDiscoveryServiceServer;
use crate::HdsNodeConfig;
use crate::Result;
use crate::SystemError;
use crate::TlsConfig;

/// Binds the configured listen address and serves until `shutdown_signal`
/// fires.
pub async fn start_rpc_server(
    service: HdsService,
    config: &HdsNodeConfig,
    shutdown_signal: watch::Receiver<()>,
) -> Result<()> {
    let listen_address = config.server.listen_address;
    let listener = TcpListener::bind(listen_address).await.map_err(|e| {
        error!("failed to bind {}: {:?}", listen_address, e);
        SystemError::NodeStartFailed(format!("bind {}: {}", listen_address, e))
    })?;
    serve_rpc(service, config, listener, shutdown_signal).await
}

/// Serves on an already bound listener.
pub async fn serve_rpc(
    service: HdsService,
    config: &HdsNodeConfig,
    listener: TcpListener,
    mut shutdown_signal: watch::Receiver<()>,
) -> Result<()> {
    let local_address = listener
        .local_addr()
        .map_err(|e| SystemError::NodeStartFailed(e.to_string()))?;

    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_serving::<HealthDiscoveryServiceServer<HdsService>>()
        .await;

    let server_config = &config.server;
    let incoming = TcpIncoming::from_listener(
        listener,
        server_config.tcp_nodelay,
        Some(Duration::from_secs(server_config.tcp_keepalive_in_secs)),
    )
    .map_err(|e| SystemError::NodeStartFailed(e.to_string()))?;

    let mut server_builder = tonic::transport::Server::builder()
        .concurrency_limit_per_connection(server_config.concurrency_limit)
        .http2_keepalive_interval(Some(Duration::from_secs(
            server_config.http2_keep_alive_interval_in_secs,
        )))
        .http2_keepalive_timeout(Some(Duration::from_secs(
            server_config.http2_keep_alive_timeout_in_secs,
        )));

    if config.tls.enable_tls {
        server_builder = server_builder.tls_config(ServerTlsConfig::new().identity(load_identity(&config.tls)?))?;
        info!("gRPC TLS enabled");
    }

    info!("HDS server listening on {}", local_address);
    if let Err(e) = server_builder
        .add_service(health_service)
        .add_service(
            HealthDiscoveryServiceServer::new(service)
                .accept_compressed(CompressionEncoding::Gzip)
                .send_compressed(CompressionEncoding::Gzip),
        )
        .serve_with_incoming_shutdown(
            incoming,
            shutdown_signal.changed().map(move |_| {
                warn!("Stopping RPC server. {}", local_address);
            }),
        )
        .await
    {
        error!("error serving HDS on {}: {:?}", local_address, e);
        return Err(SystemError::ServerUnavailable.into());
    }
    debug!("rpc service finished!");
    Ok(())
}

fn load_identity(tls: &TlsConfig) -> Result<Identity> {
    let cert = std::fs::read_to_string(&tls.server_certificate_path).map_err(|e| {
        SystemError::NodeStartFailed(format!(
            "failed to read server certificate {}: {}",
            tls.server_certificate_path, e
        ))
    })?;
    let key = std::fs::read_to_string(&tls.server_private_key_path).map_err(|e| {
        SystemError::NodeStartFailed(format!(
            "failed to read server private key {}: {}",
            tls.server_private_key_path, e
        ))
    })?;
    Ok(Identity::from_pem(cert, key))
}
