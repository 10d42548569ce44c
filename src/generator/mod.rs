//! Desired health-check configuration for one proxy.
//!
//! Every inbound listener gets a TCP probe against the workload behind it,
//! and the proxy's admin endpoint gets an HTTP readiness probe so a draining
//! proxy is noticed even while its workloads still answer.

mod default_generator;
pub use default_generator::*;


#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::ProxyIdentity;
use crate::Result;
use crate::Snapshot;

/// Cluster probing the proxy's own admin endpoint.
pub const ADMIN_CLUSTER_NAME: &str = "envoy:admin";
/// Readiness path of the admin endpoint.
pub const ADMIN_READY_PATH: &str = "/ready";
/// Address the admin endpoint is probed on, from the proxy's point of view.
pub const ADMIN_ADDRESS: &str = "127.0.0.1";

const INBOUND_CLUSTER_PREFIX: &str = "localhost:";

/// Name of the cluster probing the workload listening on `port`.
pub fn inbound_cluster_name(port: u32) -> String {
    format!("{INBOUND_CLUSTER_PREFIX}{port}")
}

/// Workload port an inbound cluster name refers to.
pub fn parse_inbound_cluster_name(name: &str) -> Option<u32> {
    name.strip_prefix(INBOUND_CLUSTER_PREFIX)?.parse().ok()
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotGenerator: Send + Sync + 'static {
    /// Builds an unversioned snapshot from the proxy's current topology record.
    ///
    /// # Errors
    /// `StoreError::ProxyNotFound` when the record is absent.
    async fn generate_snapshot(
        &self,
        proxy: &ProxyIdentity,
    ) -> Result<Snapshot>;
}
