use std::time::Duration;

use super::hds::health_check::HealthChecker;
use super::hds::health_check::HttpHealthCheck;
use super::hds::health_check::TcpHealthCheck;
use super::hds::health_check_request_or_endpoint_health_response::RequestType;
use super::hds::Capability;
use super::hds::Endpoint;
use super::hds::EndpointHealthResponse;
use super::hds::HealthCheckRequest;
use super::hds::HealthCheckRequestOrEndpointHealthResponse;
use super::hds::HealthStatus;
use super::hds::Node;
use super::hds::SocketAddress;

/// Converts milliseconds into a protobuf duration.
pub fn proto_duration(ms: u64) -> prost_types::Duration {
    let d = Duration::from_millis(ms);
    prost_types::Duration {
        seconds: d.as_secs() as i64,
        nanos: d.subsec_nanos() as i32,
    }
}

impl HealthStatus {
    /// Readiness a status implies for the listener it was measured on.
    ///
    /// `None` means the proxy has no opinion yet and the stored flag is kept.
    pub fn readiness(self) -> Option<bool> {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => Some(true),
            HealthStatus::Unhealthy | HealthStatus::Draining | HealthStatus::Timeout => Some(false),
            HealthStatus::Unknown => None,
        }
    }
}

impl HealthChecker {
    pub fn tcp() -> Self {
        HealthChecker::TcpHealthCheck(TcpHealthCheck {})
    }

    pub fn http(path: impl Into<String>) -> Self {
        HealthChecker::HttpHealthCheck(HttpHealthCheck { path: path.into() })
    }
}

impl Endpoint {
    pub fn socket(
        address: impl Into<String>,
        port: u32,
    ) -> Self {
        Endpoint {
            address: Some(SocketAddress {
                address: address.into(),
                port_value: port,
            }),
        }
    }
}

impl HealthCheckRequestOrEndpointHealthResponse {
    pub fn health_check_request(node_id: impl Into<String>) -> Self {
        Self {
            request_type: Some(RequestType::HealthCheckRequest(HealthCheckRequest {
                node: Some(Node {
                    id: node_id.into(),
                    cluster: String::new(),
                }),
                capability: Some(Capability {
                    health_check_protocols: Vec::new(),
                }),
            })),
        }
    }

    pub fn endpoint_health_response(response: EndpointHealthResponse) -> Self {
        Self {
            request_type: Some(RequestType::EndpointHealthResponse(response)),
        }
    }
}

impl HealthCheckRequest {
    /// Node id carried by the request, `None` when absent or empty.
    pub fn node_id(&self) -> Option<&str> {
        self.node
            .as_ref()
            .map(|n| n.id.as_str())
            .filter(|id| !id.is_empty())
    }
}
