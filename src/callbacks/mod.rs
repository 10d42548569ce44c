//! Stream lifecycle hooks.
//!
//! Each component interested in a stream implements [`Callbacks`]. The
//! server talks to a single [`CallbacksChain`] which dispatches to them in
//! registration order.

mod metrics_callbacks;
pub use metrics_callbacks::*;

#[cfg(test)]
mod callbacks_test;

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;
use tonic::metadata::MetadataMap;

use crate::proto::hds::EndpointHealthResponse;
use crate::proto::hds::HealthCheckRequest;
use crate::Result;
use crate::StreamId;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Callbacks: Send + Sync + 'static {
    /// Stream accepted, `metadata` is the connection's request metadata.
    fn on_stream_open(
        &self,
        _stream_id: StreamId,
        _metadata: &MetadataMap,
    ) -> Result<()> {
        Ok(())
    }

    /// Stream finished, whatever the reason.
    fn on_stream_closed(
        &self,
        _stream_id: StreamId,
    ) {
    }

    /// Called with the node already resolved: a request without node id
    /// carries the stream's previous node.
    async fn on_health_check_request(
        &self,
        _stream_id: StreamId,
        _request: &HealthCheckRequest,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_endpoint_health_response(
        &self,
        _stream_id: StreamId,
        _response: &EndpointHealthResponse,
    ) -> Result<()> {
        Ok(())
    }
}

/// Ordered list of [`Callbacks`].
///
/// Dispatch stops at the first error. Close hooks run in reverse order so a
/// component is torn down before the ones it was set up after.
#[derive(Default, Clone)]
pub struct CallbacksChain {
    callbacks: Vec<Arc<dyn Callbacks>>,
}

impl std::fmt::Debug for CallbacksChain {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CallbacksChain")
            .field("len", &self.callbacks.len())
            .finish()
    }
}

impl CallbacksChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        callbacks: Arc<dyn Callbacks>,
    ) -> Self {
        self.callbacks.push(callbacks);
        self
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[async_trait]
impl Callbacks for CallbacksChain {
    fn on_stream_open(
        &self,
        stream_id: StreamId,
        metadata: &MetadataMap,
    ) -> Result<()> {
        for cb in &self.callbacks {
            cb.on_stream_open(stream_id, metadata)?;
        }
        Ok(())
    }

    fn on_stream_closed(
        &self,
        stream_id: StreamId,
    ) {
        for cb in self.callbacks.iter().rev() {
            cb.on_stream_closed(stream_id);
        }
    }

    async fn on_health_check_request(
        &self,
        stream_id: StreamId,
        request: &HealthCheckRequest,
    ) -> Result<()> {
        for cb in &self.callbacks {
            cb.on_health_check_request(stream_id, request).await?;
        }
        Ok(())
    }

    async fn on_endpoint_health_response(
        &self,
        stream_id: StreamId,
        response: &EndpointHealthResponse,
    ) -> Result<()> {
        for cb in &self.callbacks {
            cb.on_endpoint_health_response(stream_id, response).await?;
        }
        Ok(())
    }
}
