//! Stream to proxy association and per-proxy watchdog ownership.
//!
//! A proxy may hold several streams at once, typically while it restarts.
//! The first stream of a proxy starts its reconcile watchdog and the last one
//! to close stops it. Stopping runs `Reconciler::clear` for the proxy.


use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::metrics::GENERATION_DURATION;
use crate::metrics::GENERATION_ERRORS;
use crate::proto::hds::HealthCheckRequest;
use crate::proto::hds::Node;
use crate::Callbacks;
use crate::ProtocolError;
use crate::ProxyIdentity;
use crate::Reconciler;
use crate::Result;
use crate::SimpleWatchdog;
use crate::StreamId;

/// Open streams of one proxy and the watchdog they keep alive.
#[derive(Debug)]
struct ActiveStreamSet {
    streams: HashSet<StreamId>,
    cancel: CancellationToken,
    watchdog: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct TrackerState {
    stream_to_proxy: HashMap<StreamId, ProxyIdentity>,
    proxies: HashMap<ProxyIdentity, ActiveStreamSet>,
    /// Cancelled watchdogs that may still be running their stop hook
    draining: HashMap<ProxyIdentity, JoinHandle<()>>,
}

pub struct StreamTracker {
    reconciler: Arc<dyn Reconciler>,
    interval: Duration,
    state: Mutex<TrackerState>,
}

impl std::fmt::Debug for StreamTracker {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("StreamTracker")
            .field("interval", &self.interval)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl StreamTracker {
    pub fn new(
        reconciler: Arc<dyn Reconciler>,
        interval: Duration,
    ) -> Self {
        Self {
            reconciler,
            interval,
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// Associates `stream_id` with the proxy `node` names.
    ///
    /// Starts the proxy's watchdog when this is its first stream. A stream
    /// that is already tracked is left alone.
    pub fn register(
        &self,
        stream_id: StreamId,
        node: &Node,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.stream_to_proxy.contains_key(&stream_id) {
            return Ok(());
        }
        let proxy = ProxyIdentity::parse(&node.id)?;

        if !state.proxies.contains_key(&proxy) {
            let predecessor = state.draining.remove(&proxy);
            let cancel = CancellationToken::new();
            let watchdog = self.new_watchdog(node.clone(), predecessor).spawn(cancel.clone());
            info!(proxy = %proxy, "watchdog started");
            state.proxies.insert(
                proxy.clone(),
                ActiveStreamSet {
                    streams: HashSet::new(),
                    cancel,
                    watchdog,
                },
            );
        }

        if let Some(set) = state.proxies.get_mut(&proxy) {
            set.streams.insert(stream_id);
        }
        debug!(stream_id = %stream_id, proxy = %proxy, "stream registered");
        state.stream_to_proxy.insert(stream_id, proxy);
        Ok(())
    }

    /// Forgets `stream_id`, stopping the proxy's watchdog if it was the last
    /// stream.
    pub fn unregister(
        &self,
        stream_id: StreamId,
    ) {
        let mut state = self.state.lock();
        state.draining.retain(|_, handle| !handle.is_finished());

        let Some(proxy) = state.stream_to_proxy.remove(&stream_id) else {
            return;
        };
        let Some(set) = state.proxies.get_mut(&proxy) else {
            return;
        };
        set.streams.remove(&stream_id);
        debug!(stream_id = %stream_id, proxy = %proxy, remaining = set.streams.len(), "stream unregistered");

        if set.streams.is_empty() {
            if let Some(set) = state.proxies.remove(&proxy) {
                set.cancel.cancel();
                info!(proxy = %proxy, "watchdog stopped");
                state.draining.insert(proxy, set.watchdog);
            }
        }
    }

    pub fn proxy_for_stream(
        &self,
        stream_id: StreamId,
    ) -> Option<ProxyIdentity> {
        self.state.lock().stream_to_proxy.get(&stream_id).cloned()
    }

    pub fn active_proxies(&self) -> Vec<ProxyIdentity> {
        let mut proxies: Vec<_> = self.state.lock().proxies.keys().cloned().collect();
        proxies.sort();
        proxies
    }

    /// Number of open streams of `proxy`.
    pub fn stream_count(
        &self,
        proxy: &ProxyIdentity,
    ) -> usize {
        self.state
            .lock()
            .proxies
            .get(proxy)
            .map(|set| set.streams.len())
            .unwrap_or(0)
    }

    /// Cancels every watchdog and waits for their stop hooks.
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut state = self.state.lock();
            state.stream_to_proxy.clear();
            let mut handles: Vec<_> = state
                .proxies
                .drain()
                .map(|(_, set)| {
                    set.cancel.cancel();
                    set.watchdog
                })
                .collect();
            handles.extend(state.draining.drain().map(|(_, handle)| handle));
            handles
        };

        for handle in handles {
            if let Err(e) = handle.await {
                error!("watchdog task failed: {:?}", e);
            }
        }
    }

    fn new_watchdog(
        &self,
        node: Node,
        predecessor: Option<JoinHandle<()>>,
    ) -> SimpleWatchdog {
        let tick_reconciler = self.reconciler.clone();
        let tick_node = node.clone();
        let stop_reconciler = self.reconciler.clone();
        let error_node_id = node.id.clone();

        SimpleWatchdog::new(self.interval, move || {
            let reconciler = tick_reconciler.clone();
            let node = tick_node.clone();
            async move { reconciler.reconcile(&node).await.map(|_| ()) }.boxed()
        })
        .on_error(move |e| {
            GENERATION_ERRORS.inc();
            warn!(proxy = %error_node_id, "health check generation failed: {}", e);
        })
        .on_stop(move || {
            if let Err(e) = stop_reconciler.clear(&node) {
                error!(proxy = %node.id, "failed to clear snapshot: {}", e);
            }
        })
        .with_latency(GENERATION_DURATION.clone())
        .after(predecessor)
    }
}

#[async_trait]
impl Callbacks for StreamTracker {
    fn on_stream_closed(
        &self,
        stream_id: StreamId,
    ) {
        self.unregister(stream_id);
    }

    async fn on_health_check_request(
        &self,
        stream_id: StreamId,
        request: &HealthCheckRequest,
    ) -> Result<()> {
        let node = request.node.as_ref().ok_or(ProtocolError::MissingNode)?;
        self.register(stream_id, node)
    }
}
