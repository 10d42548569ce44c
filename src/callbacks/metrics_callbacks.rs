use tonic::async_trait;
use tonic::metadata::MetadataMap;

use super::Callbacks;
use crate::metrics::ACTIVE_STREAMS;
use crate::metrics::REQUESTS_RECEIVED;
use crate::metrics::RESPONSES_RECEIVED;
use crate::proto::hds::EndpointHealthResponse;
use crate::proto::hds::HealthCheckRequest;
use crate::Result;
use crate::StreamId;

/// Counts streams and messages. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsCallbacks;

#[async_trait]
impl Callbacks for MetricsCallbacks {
    fn on_stream_open(
        &self,
        _stream_id: StreamId,
        _metadata: &MetadataMap,
    ) -> Result<()> {
        ACTIVE_STREAMS.inc();
        Ok(())
    }

    fn on_stream_closed(
        &self,
        _stream_id: StreamId,
    ) {
        ACTIVE_STREAMS.dec();
    }

    async fn on_health_check_request(
        &self,
        _stream_id: StreamId,
        _request: &HealthCheckRequest,
    ) -> Result<()> {
        REQUESTS_RECEIVED.inc();
        Ok(())
    }

    async fn on_endpoint_health_response(
        &self,
        _stream_id: StreamId,
        _response: &EndpointHealthResponse,
    ) -> Result<()> {
        RESPONSES_RECEIVED.inc();
        Ok(())
    }
}
