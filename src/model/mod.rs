//! Proxy identity and the topology records this subsystem reads and patches.
//!
//! A [`Dataplane`] is owned by the topology store. Health discovery only reads
//! its networking section and writes the per-inbound [`InboundHealth`] flag.

mod identity;
pub use identity::*;


use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Kind of proxy a record describes. Selects the credential verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    #[default]
    Dataplane,
    ZoneIngress,
    ZoneEgress,
}

impl fmt::Display for ProxyKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            ProxyKind::Dataplane => "dataplane",
            ProxyKind::ZoneIngress => "zone_ingress",
            ProxyKind::ZoneEgress => "zone_egress",
        };
        f.write_str(name)
    }
}

/// Topology record of one proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataplane {
    pub mesh: String,
    pub name: String,

    #[serde(default)]
    pub kind: ProxyKind,

    /// Optimistic concurrency version, bumped by the store on every update
    #[serde(default)]
    pub version: u64,

    pub networking: Networking,
}

impl Dataplane {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(&self.mesh, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Networking {
    /// Address of the proxy's host
    pub address: String,

    /// Port of the proxy's own admin endpoint
    #[serde(default = "default_admin_port")]
    pub admin_port: u32,

    #[serde(default)]
    pub inbound: Vec<Inbound>,
}

fn default_admin_port() -> u32 {
    9901
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Inbound {
    /// Port the proxy listens on for this inbound
    pub port: u32,

    /// Port of the workload behind the proxy, defaults to `port`
    #[serde(default)]
    pub service_port: Option<u32>,

    /// Address of the workload behind the proxy, defaults to the networking address
    #[serde(default)]
    pub service_address: Option<String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub service_probe: Option<ServiceProbe>,

    #[serde(default)]
    pub health: Option<InboundHealth>,
}

impl Inbound {
    pub fn workload_port(&self) -> u32 {
        self.service_port.unwrap_or(self.port)
    }

    pub fn workload_address<'a>(
        &'a self,
        networking: &'a Networking,
    ) -> &'a str {
        self.service_address
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(networking.address.as_str())
    }

    pub fn is_ready(&self) -> Option<bool> {
        self.health.as_ref().map(|h| h.ready)
    }
}

/// Per-inbound overrides of the configured probe defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServiceProbe {
    #[serde(default)]
    pub interval_in_ms: Option<u64>,
    #[serde(default)]
    pub timeout_in_ms: Option<u64>,
    #[serde(default)]
    pub healthy_threshold: Option<u32>,
    #[serde(default)]
    pub unhealthy_threshold: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundHealth {
    pub ready: bool,
}
