use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Request;
use tonic::Response;
use tonic::Status;
use tonic::Streaming;
use tracing::debug;
use tracing::warn;

use super::OutboundMessage;
use super::ProtocolServer;
use crate::proto::hds::health_discovery_service_server::HealthDiscoveryService;
use crate::proto::hds::HealthCheckRequestOrEndpointHealthResponse;
use crate::StreamId;

/// tonic facade of [`ProtocolServer`]. Each call gets a fresh [`StreamId`]
/// and its own processing task.
#[derive(Debug, Clone)]
pub struct HdsService {
    server: Arc<ProtocolServer>,
    buffer: usize,
}

impl HdsService {
    pub fn new(
        server: Arc<ProtocolServer>,
        buffer: usize,
    ) -> Self {
        Self {
            server,
            buffer: buffer.max(1),
        }
    }
}

#[tonic::async_trait]
impl HealthDiscoveryService for HdsService {
    type StreamHealthCheckStream = ReceiverStream<OutboundMessage>;

    async fn stream_health_check(
        &self,
        request: Request<Streaming<HealthCheckRequestOrEndpointHealthResponse>>,
    ) -> std::result::Result<Response<Self::StreamHealthCheckStream>, Status> {
        let stream_id = StreamId::next();
        let metadata = request.metadata().clone();
        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(self.buffer);

        let server = self.server.clone();
        tokio::spawn(async move {
            match server.process_stream(stream_id, &metadata, inbound, tx.clone()).await {
                Ok(()) => debug!(stream_id = %stream_id, "stream completed"),
                Err(e) => {
                    warn!(stream_id = %stream_id, "stream failed: {}", e);
                    let _ = tx.send(Err(e.into())).await;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
