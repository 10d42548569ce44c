use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::Stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tonic::metadata::MetadataMap;
use tonic::Status;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::proto::hds::health_check_request_or_endpoint_health_response::RequestType;
use crate::proto::hds::HealthCheckRequestOrEndpointHealthResponse;
use crate::proto::hds::HealthCheckSpecifier;
use crate::proto::hds::Node;
use crate::Callbacks;
use crate::Error;
use crate::Result;
use crate::SnapshotCache;
use crate::StreamError;
use crate::StreamId;
use crate::WatchHandle;
use crate::WatchRequest;
use crate::WatchResponse;
use crate::HEALTH_CHECK_SPECIFIER_TYPE;

pub type InboundMessage = std::result::Result<HealthCheckRequestOrEndpointHealthResponse, Status>;
pub type OutboundMessage = std::result::Result<HealthCheckSpecifier, Status>;

type ArmedWatch = (oneshot::Receiver<WatchResponse>, WatchHandle);

/// Drives one HDS stream: authenticates through the callbacks, forwards
/// reports and pushes every new snapshot of the stream's node.
pub struct ProtocolServer {
    cache: Arc<SnapshotCache>,
    callbacks: Arc<dyn Callbacks>,
    buffer: usize,
}

impl std::fmt::Debug for ProtocolServer {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ProtocolServer")
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

/// Runs `on_stream_closed` however the stream loop ends.
struct CloseGuard {
    stream_id: StreamId,
    callbacks: Arc<dyn Callbacks>,
    stop: Arc<AtomicBool>,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.callbacks.on_stream_closed(self.stream_id);
        debug!(stream_id = %self.stream_id, "stream closed");
    }
}

impl ProtocolServer {
    pub fn new(
        cache: Arc<SnapshotCache>,
        callbacks: Arc<dyn Callbacks>,
        buffer: usize,
    ) -> Self {
        Self {
            cache,
            callbacks,
            buffer: buffer.max(1),
        }
    }

    /// Processes `inbound` until it ends or a fatal error occurs.
    ///
    /// Specifiers are written to `outbound`, which is the stream's single
    /// writer. Returns `Ok` when the proxy closed the stream.
    pub async fn process_stream<S>(
        &self,
        stream_id: StreamId,
        metadata: &MetadataMap,
        inbound: S,
        outbound: mpsc::Sender<OutboundMessage>,
    ) -> Result<()>
    where
        S: Stream<Item = InboundMessage> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let _guard = CloseGuard {
            stream_id,
            callbacks: self.callbacks.clone(),
            stop: stop.clone(),
        };
        self.callbacks.on_stream_open(stream_id, metadata)?;
        debug!(stream_id = %stream_id, "stream opened");

        let mut received = spawn_receiver(stream_id, inbound, self.buffer, stop);

        let mut node: Option<Node> = None;
        let mut last_version = String::new();
        let mut watch: Option<ArmedWatch> = None;

        loop {
            tokio::select! {
                message = received.recv() => {
                    let Some(message) = message else {
                        debug!(stream_id = %stream_id, "inbound stream finished");
                        return Ok(());
                    };

                    match message?.request_type {
                        Some(RequestType::HealthCheckRequest(mut request)) => {
                            if request.node_id().is_none() {
                                if let Some(previous) = &node {
                                    request.node = Some(previous.clone());
                                }
                            }

                            if let Err(e) = self.callbacks.on_health_check_request(stream_id, &request).await {
                                self.recover(stream_id, e)?;
                                continue;
                            }

                            let Some(current) = request.node else {
                                continue;
                            };
                            if node.as_ref().map(|n| n.id != current.id).unwrap_or(true) {
                                info!(stream_id = %stream_id, node = %current.id, "watching node");
                                last_version.clear();
                                watch = Some(self.arm(&current, &last_version));
                                node = Some(current);
                            }
                        }
                        Some(RequestType::EndpointHealthResponse(response)) => {
                            if let Err(e) = self.callbacks.on_endpoint_health_response(stream_id, &response).await {
                                self.recover(stream_id, e)?;
                            }
                        }
                        None => {
                            debug!(stream_id = %stream_id, "ignoring message without payload");
                        }
                    }
                }

                pushed = next_push(&mut watch) => {
                    watch = None;
                    match pushed {
                        Ok(response) => {
                            debug!(
                                stream_id = %stream_id,
                                version = %response.version,
                                clusters = response.specifier.cluster_health_checks.len(),
                                "pushing health check specifier"
                            );
                            outbound
                                .send(Ok(response.specifier))
                                .await
                                .map_err(|_| StreamError::ChannelClosed(format!("outbound of stream {}", stream_id)))?;
                            last_version = response.version;
                        }
                        Err(_) => {
                            trace!(stream_id = %stream_id, "watch dropped by the cache");
                        }
                    }
                    if let Some(current) = &node {
                        watch = Some(self.arm(current, &last_version));
                    }
                }
            }
        }
    }

    fn arm(
        &self,
        node: &Node,
        version: &str,
    ) -> ArmedWatch {
        self.cache.create_watch(WatchRequest {
            node: node.clone(),
            type_url: HEALTH_CHECK_SPECIFIER_TYPE.to_string(),
            version_info: version.to_string(),
        })
    }

    /// Logs a recoverable error, hands back a fatal one.
    fn recover(
        &self,
        stream_id: StreamId,
        e: Error,
    ) -> Result<()> {
        if e.is_fatal_to_stream() {
            warn!(stream_id = %stream_id, "closing stream: {}", e);
            return Err(e);
        }
        warn!(stream_id = %stream_id, "ignoring message: {}", e);
        Ok(())
    }
}

/// Forwards `inbound` into a bounded channel until the stop flag is raised or
/// the receiving side goes away.
fn spawn_receiver<S>(
    stream_id: StreamId,
    inbound: S,
    buffer: usize,
    stop: Arc<AtomicBool>,
) -> mpsc::Receiver<InboundMessage>
where
    S: Stream<Item = InboundMessage> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(buffer);
    tokio::spawn(async move {
        let mut inbound = Box::pin(inbound);
        while let Some(message) = inbound.next().await {
            if stop.load(Ordering::Acquire) {
                break;
            }
            if tx.send(message).await.is_err() {
                break;
            }
        }
        trace!(stream_id = %stream_id, "receive loop finished");
    });
    rx
}

async fn next_push(watch: &mut Option<ArmedWatch>) -> std::result::Result<WatchResponse, oneshot::error::RecvError> {
    match watch {
        Some((rx, _)) => rx.await,
        None => std::future::pending().await,
    }
}
