//! Folds proxy health reports back into the topology store.


use std::collections::BTreeMap;
use std::sync::Arc;

use tonic::async_trait;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::metrics::GENERATION_ERRORS;
use crate::metrics::STORE_UPDATES;
use crate::parse_inbound_cluster_name;
use crate::proto::hds::ClusterEndpointsHealth;
use crate::proto::hds::EndpointHealthResponse;
use crate::proto::hds::Node;
use crate::Callbacks;
use crate::Dataplane;
use crate::Error;
use crate::InboundHealth;
use crate::Reconciler;
use crate::ResourceStore;
use crate::Result;
use crate::StoreError;
use crate::StreamError;
use crate::StreamId;
use crate::StreamTracker;
use crate::ADMIN_CLUSTER_NAME;

/// Readiness per workload port, as reported by one response.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReportedHealth {
    /// `None` when the admin cluster was absent or had no opinion
    pub admin_ready: Option<bool>,
    /// Ports whose cluster carried at least one endpoint status
    pub inbound: BTreeMap<u32, Option<bool>>,
}

impl ReportedHealth {
    pub fn from_response(response: &EndpointHealthResponse) -> Self {
        let mut reported = Self::default();
        for cluster in &response.cluster_endpoints_health {
            let Some(readiness) = cluster_readiness(cluster) else {
                continue;
            };
            if cluster.cluster_name == ADMIN_CLUSTER_NAME {
                reported.admin_ready = readiness;
            } else if let Some(port) = parse_inbound_cluster_name(&cluster.cluster_name) {
                reported.inbound.insert(port, readiness);
            } else {
                debug!(cluster = %cluster.cluster_name, "ignoring health of unknown cluster");
            }
        }
        reported
    }

    /// Desired flag of the listener probed on `port`, `None` to keep it.
    pub fn desired(
        &self,
        port: u32,
    ) -> Option<bool> {
        let reported = self.inbound.get(&port)?;
        if self.admin_ready == Some(false) {
            return Some(false);
        }
        *reported
    }
}

/// `None`: no endpoint statuses at all. `Some(None)`: statuses without an
/// opinion. Any not-ready endpoint makes the cluster not ready.
fn cluster_readiness(cluster: &ClusterEndpointsHealth) -> Option<Option<bool>> {
    let mut statuses = cluster
        .locality_endpoints_health
        .iter()
        .flat_map(|l| l.endpoints_health.iter())
        .map(|e| e.health_status().readiness())
        .peekable();
    statuses.peek()?;

    let mut readiness = None;
    for status in statuses {
        match status {
            Some(false) => return Some(Some(false)),
            Some(true) => readiness = Some(true),
            None => {}
        }
    }
    Some(readiness)
}

/// Applies reported readiness to `record`, returns whether anything changed.
pub fn apply_reported_health(
    record: &mut Dataplane,
    reported: &ReportedHealth,
) -> bool {
    let mut changed = false;
    for inbound in &mut record.networking.inbound {
        let Some(ready) = reported.desired(inbound.workload_port()) else {
            continue;
        };
        if inbound.is_ready() != Some(ready) {
            inbound.health = Some(InboundHealth { ready });
            changed = true;
        }
    }
    changed
}

pub struct HealthStatusUpdater {
    tracker: Arc<StreamTracker>,
    store: Arc<dyn ResourceStore>,
    reconciler: Arc<dyn Reconciler>,
}

impl std::fmt::Debug for HealthStatusUpdater {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("HealthStatusUpdater").finish_non_exhaustive()
    }
}

impl HealthStatusUpdater {
    pub fn new(
        tracker: Arc<StreamTracker>,
        store: Arc<dyn ResourceStore>,
        reconciler: Arc<dyn Reconciler>,
    ) -> Self {
        Self {
            tracker,
            store,
            reconciler,
        }
    }

    /// Writes the readiness carried by `response` to the stream's proxy record.
    ///
    /// The store is only written when a flag actually changes. Returns whether
    /// a write happened. Write failures are returned as is; the next report
    /// retries naturally.
    pub async fn apply_report(
        &self,
        stream_id: StreamId,
        response: &EndpointHealthResponse,
    ) -> Result<bool> {
        let proxy = self
            .tracker
            .proxy_for_stream(stream_id)
            .ok_or(StreamError::NoAssociatedProxy(stream_id))?;

        let reported = ReportedHealth::from_response(response);
        let mut record = self.store.get(&proxy).await?;
        if !apply_reported_health(&mut record, &reported) {
            debug!(stream_id = %stream_id, proxy = %proxy, "health unchanged");
            return Ok(false);
        }

        match self.store.update(record).await {
            Ok(stored) => {
                STORE_UPDATES.with_label_values(&["ok"]).inc();
                info!(proxy = %proxy, version = stored.version, "inbound health updated");
            }
            Err(e) => {
                let result = match &e {
                    Error::Store(StoreError::StoreWriteConflict { .. }) => "conflict",
                    _ => "error",
                };
                STORE_UPDATES.with_label_values(&[result]).inc();
                warn!(proxy = %proxy, "failed to update inbound health: {}", e);
                return Err(e);
            }
        }

        let node = Node {
            id: proxy.node_id(),
            cluster: String::new(),
        };
        if let Err(e) = self.reconciler.reconcile(&node).await {
            GENERATION_ERRORS.inc();
            warn!(proxy = %proxy, "reconcile after health update failed: {}", e);
        }
        Ok(true)
    }
}

#[async_trait]
impl Callbacks for HealthStatusUpdater {
    async fn on_endpoint_health_response(
        &self,
        stream_id: StreamId,
        response: &EndpointHealthResponse,
    ) -> Result<()> {
        self.apply_report(stream_id, response).await.map(|_| ())
    }
}
