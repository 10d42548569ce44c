use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio::sync::watch;
use tracing::error;
use tracing::warn;
use warp::Filter;
use warp::Rejection;
use warp::Reply;


lazy_static! {
    pub static ref REQUESTS_RECEIVED: IntCounter = IntCounter::new(
        "hds_requests_received_total",
        "HealthCheckRequest messages received from proxies"
    )
    .expect("metric can not be created");

    pub static ref RESPONSES_RECEIVED: IntCounter = IntCounter::new(
        "hds_responses_received_total",
        "EndpointHealthResponse messages received from proxies"
    )
    .expect("metric can not be created");

    pub static ref GENERATION_ERRORS: IntCounter = IntCounter::new(
        "hds_generation_errors_total",
        "Failed snapshot reconciles"
    )
    .expect("metric can not be created");

    pub static ref GENERATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "hds_generation_duration_seconds",
            "Latency of a reconcile tick in seconds"
        )
        .buckets(exponential_buckets(0.0005, 2.0, 14).expect("valid buckets"))
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_STREAMS: IntGauge = IntGauge::new(
        "hds_active_streams",
        "Open health discovery streams"
    )
    .expect("metric can not be created");

    pub static ref STORE_UPDATES: IntCounterVec = IntCounterVec::new(
        Opts::new("hds_store_updates_total", "Readiness write-backs to the topology store"),
        &["result"]
    )
    .expect("metric can not be created");

    pub static ref AUTH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("hds_auth_failures_total", "Rejected stream authentications"),
        &["reason"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER_DEFAULT: Once = Once::new();

/// Registers every collector of this crate into `registry`.
pub fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(REQUESTS_RECEIVED.clone()),
        Box::new(RESPONSES_RECEIVED.clone()),
        Box::new(GENERATION_ERRORS.clone()),
        Box::new(GENERATION_DURATION.clone()),
        Box::new(ACTIVE_STREAMS.clone()),
        Box::new(STORE_UPDATES.clone()),
        Box::new(AUTH_FAILURES.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!("collector can not be registered: {}", e);
        }
    }
}

/// Serves `/metrics` until `shutdown_signal` fires.
pub async fn start_server(
    port: u16,
    mut shutdown_signal: watch::Receiver<()>,
) {
    REGISTER_DEFAULT.call_once(|| register_custom_metrics(&REGISTRY));

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    let (_, server) = warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
        let _ = shutdown_signal.changed().await;
    });
    server.await;
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(encode_registry(&REGISTRY))
}

pub(crate) fn encode_registry(registry: &Registry) -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
