use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::metrics;
use crate::utils::async_task::spawn_task;
use crate::serve_rpc;
use crate::start_rpc_server;
use crate::HdsNodeConfig;
use crate::HdsService;
use crate::ResourceStore;
use crate::Result;
use crate::SnapshotCache;
use crate::StreamTracker;

/// A fully wired HDS control plane.
pub struct HdsNode {
    pub(super) config: HdsNodeConfig,
    pub(super) store: Arc<dyn ResourceStore>,
    pub(super) cache: Arc<SnapshotCache>,
    pub(super) tracker: Arc<StreamTracker>,
    pub(super) service: HdsService,
    pub(super) shutdown_signal: watch::Receiver<()>,
}

impl std::fmt::Debug for HdsNode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("HdsNode")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl HdsNode {
    pub fn config(&self) -> &HdsNodeConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn ResourceStore> {
        self.store.clone()
    }

    pub fn cache(&self) -> Arc<SnapshotCache> {
        self.cache.clone()
    }

    pub fn tracker(&self) -> Arc<StreamTracker> {
        self.tracker.clone()
    }

    pub fn service(&self) -> HdsService {
        self.service.clone()
    }

    /// Spawns the Prometheus endpoint when monitoring is enabled.
    pub fn start_metrics_server(
        &self,
        shutdown_signal: watch::Receiver<()>,
    ) {
        if !self.config.monitoring.prometheus_enabled {
            return;
        }
        let port = self.config.monitoring.prometheus_port;
        info!("metrics server listening on port {}", port);
        spawn_task("metrics server", move || async move {
            metrics::start_server(port, shutdown_signal).await;
            Ok(())
        });
    }

    /// Serves on the configured listen address until shutdown.
    pub async fn run(&self) -> Result<()> {
        let result = start_rpc_server(self.service(), &self.config, self.shutdown_signal.clone()).await;
        self.stop().await;
        result
    }

    /// Serves on `listener` until shutdown.
    pub async fn run_with_listener(
        &self,
        listener: TcpListener,
    ) -> Result<()> {
        let result = serve_rpc(self.service(), &self.config, listener, self.shutdown_signal.clone()).await;
        self.stop().await;
        result
    }

    /// Stops every watchdog, then drops all cached snapshots.
    async fn stop(&self) {
        self.tracker.shutdown().await;
        for key in self.cache.node_keys() {
            self.cache.clear_snapshot(&key);
        }
        info!("HDS node stopped");
    }
}
