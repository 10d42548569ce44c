use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataMap;

use super::*;
use crate::inbound_cluster_name;
use crate::proto::hds::ClusterEndpointsHealth;
use crate::proto::hds::EndpointHealth;
use crate::proto::hds::EndpointHealthResponse;
use crate::proto::hds::HealthCheckRequestOrEndpointHealthResponse;
use crate::proto::hds::HealthCheckSpecifier;
use crate::proto::hds::HealthStatus;
use crate::proto::hds::LocalityEndpointsHealth;
use crate::test_utils::dataplane;
use crate::verifiers_from_config;
use crate::AuthError;
use crate::AuthnConfig;
use crate::BackoffPolicy;
use crate::CallbacksChain;
use crate::DefaultSnapshotGenerator;
use crate::Error;
use crate::HdsConfig;
use crate::HealthStatusUpdater;
use crate::MemoryResourceStore;
use crate::MetricsCallbacks;
use crate::ProtocolError;
use crate::ResourceKey;
use crate::ResourceStore;
use crate::Result;
use crate::SnapshotCache;
use crate::SnapshotReconciler;
use crate::StreamAuthenticator;
use crate::StreamId;
use crate::StreamTracker;
use crate::ADMIN_CLUSTER_NAME;
use crate::AUTHORIZATION_KEY;

struct Harness {
    store: Arc<MemoryResourceStore>,
    cache: Arc<SnapshotCache>,
    tracker: Arc<StreamTracker>,
    server: Arc<ProtocolServer>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryResourceStore::new());
    store.insert(dataplane("default", "web-1", &[8080]));
    store.insert(dataplane("default", "web-2", &[8080]));

    let cache = Arc::new(SnapshotCache::default());
    let generator = Arc::new(DefaultSnapshotGenerator::new(store.clone(), HdsConfig::default()));
    let reconciler = Arc::new(SnapshotReconciler::new(generator, cache.clone()));
    let tracker = Arc::new(StreamTracker::new(reconciler.clone(), Duration::from_secs(10)));
    let authenticator = Arc::new(StreamAuthenticator::new(
        store.clone(),
        verifiers_from_config(&AuthnConfig::default()),
        BackoffPolicy {
            max_retries: 1,
            timeout_ms: 100,
            base_delay_ms: 1,
            max_delay_ms: 1,
        },
    ));
    let status = Arc::new(HealthStatusUpdater::new(tracker.clone(), store.clone(), reconciler));

    let chain = CallbacksChain::new()
        .with(Arc::new(MetricsCallbacks))
        .with(authenticator)
        .with(tracker.clone())
        .with(status);

    Harness {
        store,
        cache: cache.clone(),
        tracker,
        server: Arc::new(ProtocolServer::new(cache, Arc::new(chain), 8)),
    }
}

fn credentials() -> MetadataMap {
    let mut metadata = MetadataMap::new();
    metadata.insert(AUTHORIZATION_KEY, "Bearer token".parse().unwrap());
    metadata
}

struct Client {
    stream_id: StreamId,
    tx: mpsc::Sender<InboundMessage>,
    rx: mpsc::Receiver<OutboundMessage>,
    handle: JoinHandle<Result<()>>,
}

fn open(
    h: &Harness,
    metadata: MetadataMap,
) -> Client {
    let stream_id = StreamId::next();
    let (tx, inbound_rx) = mpsc::channel(8);
    let (outbound_tx, rx) = mpsc::channel(8);
    let server = h.server.clone();
    let handle = tokio::spawn(async move {
        server
            .process_stream(stream_id, &metadata, ReceiverStream::new(inbound_rx), outbound_tx)
            .await
    });
    Client {
        stream_id,
        tx,
        rx,
        handle,
    }
}

impl Client {
    async fn request(
        &self,
        node_id: &str,
    ) {
        self.tx
            .send(Ok(HealthCheckRequestOrEndpointHealthResponse::health_check_request(node_id)))
            .await
            .unwrap();
    }

    async fn report(
        &self,
        cluster_name: &str,
        status: HealthStatus,
    ) {
        let response = EndpointHealthResponse {
            cluster_endpoints_health: vec![ClusterEndpointsHealth {
                cluster_name: cluster_name.to_string(),
                locality_endpoints_health: vec![LocalityEndpointsHealth {
                    endpoints_health: vec![EndpointHealth {
                        endpoint: None,
                        health_status: status as i32,
                    }],
                }],
            }],
        };
        self.tx
            .send(Ok(HealthCheckRequestOrEndpointHealthResponse::endpoint_health_response(
                response,
            )))
            .await
            .unwrap();
    }

    async fn next_push(&mut self) -> Option<HealthCheckSpecifier> {
        match tokio::time::timeout(Duration::from_secs(1), self.rx.recv()).await {
            Ok(Some(Ok(specifier))) => Some(specifier),
            _ => None,
        }
    }

    async fn close(self) -> Result<()> {
        drop(self.tx);
        self.handle.await.unwrap()
    }
}

fn cluster_names(specifier: &HealthCheckSpecifier) -> Vec<String> {
    specifier
        .cluster_health_checks
        .iter()
        .map(|c| c.cluster_name.clone())
        .collect()
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn first_request_is_answered_with_a_specifier() {
    let h = harness();
    let mut client = open(&h, credentials());

    client.request("default.web-1").await;

    let specifier = client.next_push().await.expect("initial push");
    assert_eq!(
        cluster_names(&specifier),
        vec![inbound_cluster_name(8080), ADMIN_CLUSTER_NAME.to_string()]
    );
    assert_eq!(h.tracker.proxy_for_stream(client.stream_id).unwrap().node_id(), "default.web-1");

    assert!(client.close().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn unchanged_regeneration_is_not_pushed_again() {
    let h = harness();
    let mut client = open(&h, credentials());
    client.request("default.web-1").await;
    assert!(client.next_push().await.is_some());

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;

    assert!(client.next_push().await.is_none());
    assert_eq!(h.cache.get_snapshot("default.web-1").unwrap().version(), "1");
}

#[tokio::test(start_paused = true)]
async fn topology_change_is_pushed_on_next_tick() {
    let h = harness();
    let mut client = open(&h, credentials());
    client.request("default.web-1").await;
    assert!(client.next_push().await.is_some());

    h.store.insert(dataplane("default", "web-1", &[8080, 9090]));
    tokio::time::advance(Duration::from_secs(10)).await;

    let specifier = client.next_push().await.expect("push after change");
    assert_eq!(specifier.cluster_health_checks.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn request_without_node_keeps_previous_node() {
    let h = harness();
    let mut client = open(&h, credentials());
    client.request("default.web-1").await;
    assert!(client.next_push().await.is_some());

    client.request("").await;
    settle().await;

    assert!(!client.handle.is_finished());
    assert_eq!(h.tracker.stream_count(&ResourceKey::new("default", "web-1")), 1);
    assert!(client.close().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn changed_node_identity_closes_the_stream() {
    let h = harness();
    let mut client = open(&h, credentials());
    client.request("default.web-1").await;
    assert!(client.next_push().await.is_some());

    client.request("default.web-2").await;
    let err = client.handle.await.unwrap().unwrap_err();

    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::NodeIdentityChanged { .. })
    ));
    settle().await;
    assert!(h.tracker.active_proxies().is_empty());
    assert!(h.cache.get_snapshot("default.web-1").unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_credential_is_fatal() {
    let h = harness();
    let client = open(&h, MetadataMap::new());

    client.request("default.web-1").await;
    let err = client.handle.await.unwrap().unwrap_err();

    assert!(matches!(
        err,
        Error::Auth(AuthError::MissingOrAmbiguousCredential { found: 0 })
    ));
    assert!(h.tracker.active_proxies().is_empty());
}

#[tokio::test(start_paused = true)]
async fn malformed_node_id_is_skipped() {
    let h = harness();
    let mut client = open(&h, credentials());

    client.request("no-mesh-separator").await;
    client.request("default.web-1").await;

    assert!(client.next_push().await.is_some());
    assert!(client.close().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn report_before_authentication_is_ignored() {
    let h = harness();
    let mut client = open(&h, credentials());

    client.report(&inbound_cluster_name(8080), HealthStatus::Unhealthy).await;
    client.request("default.web-1").await;

    assert!(client.next_push().await.is_some());
    let record = h.store.get(&ResourceKey::new("default", "web-1")).await.unwrap();
    assert_eq!(record.networking.inbound[0].is_ready(), None);
}

#[tokio::test(start_paused = true)]
async fn unhealthy_report_marks_listener_not_ready() {
    let h = harness();
    let mut client = open(&h, credentials());
    client.request("default.web-1").await;
    assert!(client.next_push().await.is_some());

    client.report(&inbound_cluster_name(8080), HealthStatus::Unhealthy).await;
    settle().await;

    let record = h.store.get(&ResourceKey::new("default", "web-1")).await.unwrap();
    assert_eq!(record.networking.inbound[0].is_ready(), Some(false));
    assert!(client.close().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn closing_last_stream_clears_the_snapshot() {
    let h = harness();
    let mut first = open(&h, credentials());
    let mut second = open(&h, credentials());
    first.request("default.web-1").await;
    second.request("default.web-1").await;
    assert!(first.next_push().await.is_some());
    assert!(second.next_push().await.is_some());

    assert!(first.close().await.is_ok());
    settle().await;
    assert!(!h.cache.get_snapshot("default.web-1").unwrap().is_empty());

    assert!(second.close().await.is_ok());
    settle().await;
    assert!(h.cache.get_snapshot("default.web-1").unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reconnect_after_teardown_first_receives_real_configuration() {
    let h = harness();
    let mut client = open(&h, credentials());
    client.request("default.web-1").await;
    assert!(client.next_push().await.is_some());
    assert!(client.close().await.is_ok());
    settle().await;
    assert!(h.cache.get_snapshot("default.web-1").unwrap().is_empty());

    let mut reconnected = open(&h, credentials());
    reconnected.request("default.web-1").await;

    let specifier = reconnected.next_push().await.expect("push after reconnect");
    assert_eq!(
        cluster_names(&specifier),
        vec![inbound_cluster_name(8080), ADMIN_CLUSTER_NAME.to_string()]
    );
    assert!(specifier.interval.is_some());
    assert_eq!(h.cache.get_snapshot("default.web-1").unwrap().version(), "3");
    assert!(reconnected.close().await.is_ok());
}
