use std::collections::BTreeMap;

use crate::proto::hds::HealthCheckSpecifier;
use crate::GenerationError;
use crate::Result;

/// Type tag of the only resource this cache carries.
pub const HEALTH_CHECK_SPECIFIER_TYPE: &str = "type.googleapis.com/envoy.service.health.v3.HealthCheckSpecifier";

/// Versioned bundle of generated configuration for one proxy.
///
/// Equality compares resource content only. Two snapshots generated from the
/// same topology are equal whatever their version strings say.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    version: String,
    resources: BTreeMap<String, HealthCheckSpecifier>,
}

impl Snapshot {
    /// Unversioned snapshot holding `specifier`.
    pub fn new(specifier: HealthCheckSpecifier) -> Self {
        let mut resources = BTreeMap::new();
        resources.insert(HEALTH_CHECK_SPECIFIER_TYPE.to_string(), specifier);
        Self {
            version: String::new(),
            resources,
        }
    }

    /// Snapshot with no resources. Marks a proxy whose streams all went away.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_version(
        mut self,
        version: impl Into<String>,
    ) -> Self {
        self.version = version.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn resource(
        &self,
        type_url: &str,
    ) -> Option<&HealthCheckSpecifier> {
        self.resources.get(type_url)
    }

    pub fn specifier(&self) -> Option<&HealthCheckSpecifier> {
        self.resource(HEALTH_CHECK_SPECIFIER_TYPE)
    }

    /// Checks the snapshot is well formed before it is committed.
    ///
    /// Only known type tags are allowed, and every cluster must name itself
    /// and carry at least one health check and one endpoint.
    pub fn consistent(&self) -> Result<()> {
        for (type_url, specifier) in &self.resources {
            if type_url != HEALTH_CHECK_SPECIFIER_TYPE {
                return Err(GenerationError::InconsistentSnapshot(format!("unknown resource type {type_url}")).into());
            }
            for cluster in &specifier.cluster_health_checks {
                if cluster.cluster_name.is_empty() {
                    return Err(GenerationError::InconsistentSnapshot("cluster without a name".into()).into());
                }
                if cluster.health_checks.is_empty() {
                    return Err(GenerationError::InconsistentSnapshot(format!(
                        "cluster {} has no health check",
                        cluster.cluster_name
                    ))
                    .into());
                }
                if cluster.locality_endpoints.iter().all(|l| l.endpoints.is_empty()) {
                    return Err(GenerationError::InconsistentSnapshot(format!(
                        "cluster {} has no endpoint",
                        cluster.cluster_name
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for Snapshot {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.resources == other.resources
    }
}

/// Version that follows `previous`.
///
/// Versions are decimal counters. Anything unparsable restarts the count.
pub fn next_version(previous: Option<&Snapshot>) -> String {
    let current = previous.and_then(|s| s.version.parse::<u64>().ok()).unwrap_or(0);
    (current + 1).to_string()
}
