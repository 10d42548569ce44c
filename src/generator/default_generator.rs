use std::collections::HashSet;
use std::sync::Arc;

use tonic::async_trait;
use tracing::debug;

use super::inbound_cluster_name;
use super::SnapshotGenerator;
use super::ADMIN_ADDRESS;
use super::ADMIN_CLUSTER_NAME;
use super::ADMIN_READY_PATH;
use crate::proto::hds::health_check::HealthChecker;
use crate::proto::hds::ClusterHealthCheck;
use crate::proto::hds::Endpoint;
use crate::proto::hds::HealthCheck;
use crate::proto::hds::HealthCheckSpecifier;
use crate::proto::hds::LocalityEndpoints;
use crate::proto::proto_duration;
use crate::CheckConfig;
use crate::Dataplane;
use crate::HdsConfig;
use crate::ProxyIdentity;
use crate::ResourceStore;
use crate::Result;
use crate::ServiceProbe;
use crate::Snapshot;

/// Generates snapshots from records in a [`ResourceStore`].
pub struct DefaultSnapshotGenerator {
    store: Arc<dyn ResourceStore>,
    config: HdsConfig,
}

impl DefaultSnapshotGenerator {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        config: HdsConfig,
    ) -> Self {
        Self { store, config }
    }

    /// Pure part of generation: record in, specifier out.
    pub fn build_specifier(
        &self,
        dataplane: &Dataplane,
    ) -> HealthCheckSpecifier {
        let defaults = &self.config.check;
        let networking = &dataplane.networking;
        let mut seen = HashSet::new();
        let mut clusters = Vec::with_capacity(networking.inbound.len() + 1);

        for inbound in &networking.inbound {
            let port = inbound.workload_port();
            if !seen.insert(port) {
                debug!(proxy = %dataplane.key(), port, "duplicate workload port, probing once");
                continue;
            }
            clusters.push(ClusterHealthCheck {
                cluster_name: inbound_cluster_name(port),
                health_checks: vec![health_check(
                    defaults,
                    inbound.service_probe.as_ref(),
                    HealthChecker::tcp(),
                )],
                locality_endpoints: vec![LocalityEndpoints {
                    endpoints: vec![Endpoint::socket(inbound.workload_address(networking), port)],
                }],
            });
        }

        clusters.push(ClusterHealthCheck {
            cluster_name: ADMIN_CLUSTER_NAME.to_string(),
            health_checks: vec![health_check(defaults, None, HealthChecker::http(ADMIN_READY_PATH))],
            locality_endpoints: vec![LocalityEndpoints {
                endpoints: vec![Endpoint::socket(ADMIN_ADDRESS, networking.admin_port)],
            }],
        });

        HealthCheckSpecifier {
            cluster_health_checks: clusters,
            interval: Some(proto_duration(self.config.report_interval_in_ms)),
        }
    }
}

fn health_check(
    defaults: &CheckConfig,
    probe: Option<&ServiceProbe>,
    checker: HealthChecker,
) -> HealthCheck {
    let probe = probe.copied().unwrap_or_default();
    HealthCheck {
        timeout: Some(proto_duration(probe.timeout_in_ms.unwrap_or(defaults.timeout_in_ms))),
        interval: Some(proto_duration(probe.interval_in_ms.unwrap_or(defaults.interval_in_ms))),
        no_traffic_interval: Some(proto_duration(defaults.no_traffic_interval_in_ms)),
        unhealthy_threshold: probe.unhealthy_threshold.unwrap_or(defaults.unhealthy_threshold),
        healthy_threshold: probe.healthy_threshold.unwrap_or(defaults.healthy_threshold),
        health_checker: Some(checker),
    }
}

#[async_trait]
impl SnapshotGenerator for DefaultSnapshotGenerator {
    async fn generate_snapshot(
        &self,
        proxy: &ProxyIdentity,
    ) -> Result<Snapshot> {
        let dataplane = self.store.get(proxy).await?;
        Ok(Snapshot::new(self.build_specifier(&dataplane)))
    }
}
