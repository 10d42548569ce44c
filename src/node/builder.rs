//! Fluent construction of an [`HdsNode`].
//!
//! The builder owns the configuration and lets callers replace the topology
//! store, the credential verifiers or the cache key function before
//! [`HdsNodeBuilder::build`] wires every component together:
//!
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let node = HdsNodeBuilder::init(config, shutdown_rx)
//!     .store(my_store)
//!     .build()?;
//! node.start_metrics_server(shutdown_tx.subscribe());
//! node.run().await?;
//! ```
//!
//! Callbacks are chained as metrics, authentication, stream tracking, then
//! health status, so a request reaches the tracker only once authenticated.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use tracing::info;

use super::HdsNode;
use crate::verifiers_from_config;
use crate::CallbacksChain;
use crate::DefaultSnapshotGenerator;
use crate::HdsNodeConfig;
use crate::HdsService;
use crate::HealthStatusUpdater;
use crate::IdHash;
use crate::MemoryResourceStore;
use crate::MetricsCallbacks;
use crate::NodeHash;
use crate::ProtocolServer;
use crate::ResourceStore;
use crate::Result;
use crate::SnapshotCache;
use crate::SnapshotReconciler;
use crate::StreamAuthenticator;
use crate::StreamTracker;
use crate::VerifierTable;

pub struct HdsNodeBuilder {
    pub(super) config: HdsNodeConfig,
    pub(super) store: Option<Arc<dyn ResourceStore>>,
    pub(super) verifiers: Option<VerifierTable>,
    pub(super) node_hash: Option<Arc<dyn NodeHash>>,
    pub(super) shutdown_signal: watch::Receiver<()>,
}

impl HdsNodeBuilder {
    /// Loads and validates the layered configuration, then applies the
    /// optional override file.
    pub fn new(
        config_path: Option<&str>,
        shutdown_signal: watch::Receiver<()>,
    ) -> Result<Self> {
        let mut config = HdsNodeConfig::new()?;
        if let Some(path) = config_path {
            info!("with_override_config from: {}", path);
            config = config.with_override_config(path)?;
        }
        Ok(Self::init(config.validate()?, shutdown_signal))
    }

    pub fn init(
        config: HdsNodeConfig,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            config,
            store: None,
            verifiers: None,
            node_hash: None,
            shutdown_signal,
        }
    }

    pub fn config(&self) -> &HdsNodeConfig {
        &self.config
    }

    /// Replaces the in-memory store seeded from `store.bootstrap_path`.
    pub fn store(
        mut self,
        store: Arc<dyn ResourceStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the verifiers selected by the `authn` section.
    pub fn verifiers(
        mut self,
        verifiers: VerifierTable,
    ) -> Self {
        self.verifiers = Some(verifiers);
        self
    }

    pub fn node_hash(
        mut self,
        node_hash: Arc<dyn NodeHash>,
    ) -> Self {
        self.node_hash = Some(node_hash);
        self
    }

    pub fn build(self) -> Result<HdsNode> {
        let config = self.config;
        let store = match self.store {
            Some(store) => store,
            None => default_store(&config)?,
        };
        let verifiers = self.verifiers.unwrap_or_else(|| verifiers_from_config(&config.authn));
        let node_hash = self.node_hash.unwrap_or_else(|| Arc::new(IdHash));

        let cache = Arc::new(SnapshotCache::new(node_hash));
        let generator = Arc::new(DefaultSnapshotGenerator::new(store.clone(), config.hds.clone()));
        let reconciler = Arc::new(SnapshotReconciler::new(generator, cache.clone()));
        let tracker = Arc::new(StreamTracker::new(reconciler.clone(), config.hds.interval()));
        let authenticator = Arc::new(StreamAuthenticator::new(
            store.clone(),
            verifiers,
            config.retry.authentication,
        ));
        let status = Arc::new(HealthStatusUpdater::new(tracker.clone(), store.clone(), reconciler));

        let callbacks = CallbacksChain::new()
            .with(Arc::new(MetricsCallbacks))
            .with(authenticator)
            .with(tracker.clone())
            .with(status);
        debug!("{} stream callbacks registered", callbacks.len());

        let buffer = config.server.stream_buffer_size;
        let server = Arc::new(ProtocolServer::new(cache.clone(), Arc::new(callbacks), buffer));

        Ok(HdsNode {
            service: HdsService::new(server, buffer),
            config,
            store,
            cache,
            tracker,
            shutdown_signal: self.shutdown_signal,
        })
    }
}

fn default_store(config: &HdsNodeConfig) -> Result<Arc<dyn ResourceStore>> {
    let store = match &config.store.bootstrap_path {
        Some(path) => MemoryResourceStore::from_bootstrap_file(path)?,
        None => MemoryResourceStore::new(),
    };
    Ok(Arc::new(store))
}
