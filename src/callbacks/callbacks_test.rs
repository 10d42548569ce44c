use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::Error;
use crate::GenerationError;

struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Callbacks for Recorder {
    fn on_stream_open(
        &self,
        stream_id: StreamId,
        _metadata: &MetadataMap,
    ) -> Result<()> {
        self.log.lock().push(format!("open:{}:{}", self.name, stream_id));
        Ok(())
    }

    fn on_stream_closed(
        &self,
        stream_id: StreamId,
    ) {
        self.log.lock().push(format!("close:{}:{}", self.name, stream_id));
    }

    async fn on_health_check_request(
        &self,
        _stream_id: StreamId,
        _request: &HealthCheckRequest,
    ) -> Result<()> {
        self.log.lock().push(format!("request:{}", self.name));
        Ok(())
    }
}

fn recorder(
    name: &'static str,
    log: &Arc<Mutex<Vec<String>>>,
) -> Arc<dyn Callbacks> {
    Arc::new(Recorder {
        name,
        log: log.clone(),
    })
}

#[tokio::test]
async fn dispatches_in_order_and_closes_in_reverse() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let chain = CallbacksChain::new()
        .with(recorder("a", &log))
        .with(recorder("b", &log));
    let id = StreamId::from(7);

    chain.on_stream_open(id, &MetadataMap::new()).unwrap();
    chain
        .on_health_check_request(id, &HealthCheckRequest::default())
        .await
        .unwrap();
    chain.on_stream_closed(id);

    assert_eq!(
        *log.lock(),
        vec!["open:a:7", "open:b:7", "request:a", "request:b", "close:b:7", "close:a:7"]
    );
}

#[tokio::test]
async fn first_error_stops_dispatch() {
    let mut failing = MockCallbacks::new();
    failing
        .expect_on_health_check_request()
        .times(1)
        .returning(|_, _| Err(GenerationError::Failed("rejected".into()).into()));
    let mut never = MockCallbacks::new();
    never.expect_on_health_check_request().never();

    let chain = CallbacksChain::new().with(Arc::new(failing)).with(Arc::new(never));

    let result = chain
        .on_health_check_request(StreamId::from(1), &HealthCheckRequest::default())
        .await;

    assert!(matches!(result, Err(Error::Generation(GenerationError::Failed(_)))));
}

#[tokio::test]
async fn response_dispatch_reaches_every_member() {
    let mut first = MockCallbacks::new();
    first
        .expect_on_endpoint_health_response()
        .times(1)
        .returning(|_, _| Ok(()));
    let mut second = MockCallbacks::new();
    second
        .expect_on_endpoint_health_response()
        .times(1)
        .returning(|_, _| Ok(()));

    let chain = CallbacksChain::new().with(Arc::new(first)).with(Arc::new(second));

    chain
        .on_endpoint_health_response(StreamId::from(1), &EndpointHealthResponse::default())
        .await
        .unwrap();
    assert_eq!(chain.len(), 2);
}

#[tokio::test]
async fn metrics_callbacks_never_fail() {
    let chain = CallbacksChain::new().with(Arc::new(MetricsCallbacks));
    let id = StreamId::next();

    chain.on_stream_open(id, &MetadataMap::new()).unwrap();
    chain
        .on_endpoint_health_response(id, &EndpointHealthResponse::default())
        .await
        .unwrap();
    chain.on_stream_closed(id);
}
