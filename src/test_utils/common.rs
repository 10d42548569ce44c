use std::collections::BTreeMap;

use crate::proto::hds::health_check::HealthChecker;
use crate::proto::hds::ClusterHealthCheck;
use crate::proto::hds::Endpoint;
use crate::proto::hds::HealthCheck;
use crate::proto::hds::HealthCheckSpecifier;
use crate::proto::hds::LocalityEndpoints;
use crate::proto::hds::Node;
use crate::proto_duration;
use crate::Dataplane;
use crate::Inbound;
use crate::Networking;
use crate::ProxyKind;

/// Dataplane at 192.168.0.1 with one inbound per port.
pub(crate) fn dataplane(
    mesh: &str,
    name: &str,
    ports: &[u32],
) -> Dataplane {
    Dataplane {
        mesh: mesh.to_string(),
        name: name.to_string(),
        kind: ProxyKind::Dataplane,
        version: 0,
        networking: Networking {
            address: "192.168.0.1".to_string(),
            admin_port: 9901,
            inbound: ports
                .iter()
                .map(|port| Inbound {
                    port: *port,
                    tags: BTreeMap::from([("service".to_string(), format!("{name}-{port}"))]),
                    ..Default::default()
                })
                .collect(),
        },
    }
}

pub(crate) fn node(id: &str) -> Node {
    Node {
        id: id.to_string(),
        cluster: String::new(),
    }
}

/// Specifier with one TCP-checked endpoint per cluster.
pub(crate) fn specifier(cluster_names: &[&str]) -> HealthCheckSpecifier {
    HealthCheckSpecifier {
        cluster_health_checks: cluster_names
            .iter()
            .map(|name| ClusterHealthCheck {
                cluster_name: name.to_string(),
                health_checks: vec![HealthCheck {
                    timeout: Some(proto_duration(1000)),
                    interval: Some(proto_duration(1000)),
                    no_traffic_interval: Some(proto_duration(1000)),
                    unhealthy_threshold: 1,
                    healthy_threshold: 1,
                    health_checker: Some(HealthChecker::tcp()),
                }],
                locality_endpoints: vec![LocalityEndpoints {
                    endpoints: vec![Endpoint::socket("192.168.0.1", 80)],
                }],
            })
            .collect(),
        interval: Some(proto_duration(5000)),
    }
}
