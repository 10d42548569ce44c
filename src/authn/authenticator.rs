use std::sync::Arc;

use dashmap::DashMap;
use tonic::async_trait;
use tonic::metadata::MetadataMap;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::VerifierTable;
use super::AUTHORIZATION_KEY;
use crate::metrics::AUTH_FAILURES;
use crate::proto::hds::HealthCheckRequest;
use crate::utils::async_task::task_with_timeout_and_exponential_backoff;
use crate::AuthError;
use crate::BackoffPolicy;
use crate::Callbacks;
use crate::Error;
use crate::ProtocolError;
use crate::ProxyIdentity;
use crate::ResourceStore;
use crate::Result;
use crate::StreamId;

#[derive(Debug)]
struct StreamContext {
    metadata: MetadataMap,
    /// Node id the stream authenticated as
    node_id: Option<String>,
}

/// Authenticates each stream once and pins its node id.
pub struct StreamAuthenticator {
    store: Arc<dyn ResourceStore>,
    verifiers: VerifierTable,
    retry: BackoffPolicy,
    streams: DashMap<StreamId, StreamContext>,
}

impl std::fmt::Debug for StreamAuthenticator {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("StreamAuthenticator")
            .field("streams", &self.streams.len())
            .field("retry", &self.retry)
            .finish()
    }
}

impl StreamAuthenticator {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        verifiers: VerifierTable,
        retry: BackoffPolicy,
    ) -> Self {
        Self {
            store,
            verifiers,
            retry,
            streams: DashMap::new(),
        }
    }

    /// Remembers the stream's metadata. Nothing is verified yet.
    pub fn stream_opened(
        &self,
        stream_id: StreamId,
        metadata: MetadataMap,
    ) {
        self.streams.insert(
            stream_id,
            StreamContext {
                metadata,
                node_id: None,
            },
        );
    }

    pub fn stream_closed(
        &self,
        stream_id: StreamId,
    ) {
        self.streams.remove(&stream_id);
    }

    /// Node id the stream is pinned to, if it authenticated.
    pub fn pinned_node_id(
        &self,
        stream_id: StreamId,
    ) -> Option<String> {
        self.streams.get(&stream_id).and_then(|ctx| ctx.node_id.clone())
    }

    /// Authenticates the stream on its first request, afterwards only checks
    /// the request still names the pinned node.
    pub async fn authenticate(
        &self,
        stream_id: StreamId,
        request: &HealthCheckRequest,
    ) -> Result<()> {
        let credential = {
            let ctx = self
                .streams
                .get(&stream_id)
                .ok_or(AuthError::UnknownStream(stream_id))?;

            if let Some(pinned) = &ctx.node_id {
                return match request.node_id() {
                    Some(received) if received != pinned => {
                        AUTH_FAILURES.with_label_values(&["identity_changed"]).inc();
                        Err(ProtocolError::NodeIdentityChanged {
                            pinned: pinned.clone(),
                            received: received.to_string(),
                        }
                        .into())
                    }
                    _ => Ok(()),
                };
            }

            single_credential(&ctx.metadata).inspect_err(|_| {
                AUTH_FAILURES.with_label_values(&["missing_credential"]).inc();
            })?
        };

        let node_id = request.node_id().ok_or(ProtocolError::MissingNode)?;
        let proxy = ProxyIdentity::parse(node_id)?;

        let record = task_with_timeout_and_exponential_backoff(
            || self.store.get(&proxy),
            self.retry,
            Error::is_proxy_not_found,
        )
        .await
        .map_err(|e| {
            AUTH_FAILURES.with_label_values(&["unknown_proxy"]).inc();
            AuthError::AuthenticationFailed {
                key: proxy.clone(),
                reason: e.to_string(),
            }
        })?;

        let verifier = self
            .verifiers
            .get(&record.kind)
            .ok_or(AuthError::NoVerifier(record.kind))?;

        if let Err(e) = verifier.verify(&record, &credential).await {
            AUTH_FAILURES.with_label_values(&["rejected"]).inc();
            warn!(stream_id = %stream_id, proxy = %proxy, "authentication failed: {}", e);
            return Err(match e {
                Error::Auth(auth) => auth.into(),
                other => AuthError::AuthenticationFailed {
                    key: proxy,
                    reason: other.to_string(),
                }
                .into(),
            });
        }

        match self.streams.get_mut(&stream_id) {
            Some(mut ctx) => {
                ctx.node_id = Some(node_id.to_string());
                info!(stream_id = %stream_id, proxy = %proxy, kind = %record.kind, "stream authenticated");
                Ok(())
            }
            None => {
                debug!(stream_id = %stream_id, "stream closed during authentication");
                Err(AuthError::UnknownStream(stream_id).into())
            }
        }
    }
}

fn single_credential(metadata: &MetadataMap) -> Result<String> {
    let values: Vec<_> = metadata.get_all(AUTHORIZATION_KEY).iter().collect();
    match values.as_slice() {
        [value] => value
            .to_str()
            .map(str::to_string)
            .map_err(|_| AuthError::MissingOrAmbiguousCredential { found: 1 }.into()),
        other => Err(AuthError::MissingOrAmbiguousCredential { found: other.len() }.into()),
    }
}

#[async_trait]
impl Callbacks for StreamAuthenticator {
    fn on_stream_open(
        &self,
        stream_id: StreamId,
        metadata: &MetadataMap,
    ) -> Result<()> {
        self.stream_opened(stream_id, metadata.clone());
        Ok(())
    }

    fn on_stream_closed(
        &self,
        stream_id: StreamId,
    ) {
        self.stream_closed(stream_id);
    }

    async fn on_health_check_request(
        &self,
        stream_id: StreamId,
        request: &HealthCheckRequest,
    ) -> Result<()> {
        self.authenticate(stream_id, request).await
    }
}
