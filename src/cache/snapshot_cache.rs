use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::RwLock;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::trace;

use super::Snapshot;
use crate::proto::hds::HealthCheckSpecifier;
use crate::proto::hds::Node;
use crate::Result;

/// Maps a wire node to its cache key.
pub trait NodeHash: Send + Sync + 'static {
    fn id(
        &self,
        node: &Node,
    ) -> String;
}

/// Keys the cache by the node id verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdHash;

impl NodeHash for IdHash {
    fn id(
        &self,
        node: &Node,
    ) -> String {
        node.id.clone()
    }
}

/// A stream's subscription: "tell me when `type_url` moves past `version_info`".
#[derive(Debug, Clone)]
pub struct WatchRequest {
    pub node: Node,
    pub type_url: String,
    /// Version the stream last received, empty before the first push
    pub version_info: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchResponse {
    pub version: String,
    pub type_url: String,
    pub specifier: HealthCheckSpecifier,
}

struct PendingWatch {
    id: u64,
    request: WatchRequest,
    tx: oneshot::Sender<WatchResponse>,
}

#[derive(Default)]
struct CacheState {
    snapshots: HashMap<String, Snapshot>,
    watches: HashMap<String, Vec<PendingWatch>>,
}

impl CacheState {
    /// Stores `snapshot` and answers every watch it satisfies.
    fn commit(
        &mut self,
        key: &str,
        snapshot: Snapshot,
    ) {
        if let Some(pending) = self.watches.remove(key) {
            let mut waiting = Vec::new();
            for watch in pending {
                if !answers(&watch.request, &snapshot) {
                    waiting.push(watch);
                    continue;
                }
                trace!(node = key, watch_id = watch.id, version = snapshot.version(), "answering watch");
                let _ = watch.tx.send(respond(&watch.request, &snapshot));
            }
            if !waiting.is_empty() {
                self.watches.insert(key.to_string(), waiting);
            }
        }
        self.snapshots.insert(key.to_string(), snapshot);
    }
}

/// Whether `snapshot` is news to a stream at `request.version_info`.
///
/// An empty snapshot only reaches streams that already hold a version. A
/// stream that has received nothing keeps waiting for real content.
fn answers(
    request: &WatchRequest,
    snapshot: &Snapshot,
) -> bool {
    if snapshot.is_empty() && request.version_info.is_empty() {
        return false;
    }
    request.version_info != snapshot.version()
}

fn respond(
    request: &WatchRequest,
    snapshot: &Snapshot,
) -> WatchResponse {
    WatchResponse {
        version: snapshot.version().to_string(),
        type_url: request.type_url.clone(),
        specifier: snapshot.resource(&request.type_url).cloned().unwrap_or_default(),
    }
}

/// Per-node store of the latest [`Snapshot`] plus pending watches.
///
/// Every read-compare-write happens under one lock so concurrent reconciles
/// of the same node serialize here.
pub struct SnapshotCache {
    hash: Arc<dyn NodeHash>,
    state: Arc<RwLock<CacheState>>,
    next_watch_id: AtomicU64,
}

impl fmt::Debug for SnapshotCache {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("SnapshotCache")
            .field("snapshots", &state.snapshots.len())
            .field("watched_nodes", &state.watches.len())
            .finish()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Arc::new(IdHash))
    }
}

impl SnapshotCache {
    pub fn new(hash: Arc<dyn NodeHash>) -> Self {
        Self {
            hash,
            state: Arc::new(RwLock::new(CacheState::default())),
            next_watch_id: AtomicU64::new(1),
        }
    }

    pub fn node_key(
        &self,
        node: &Node,
    ) -> String {
        self.hash.id(node)
    }

    /// Returns the snapshot for `key`, `None` if it was never set.
    pub fn get_snapshot(
        &self,
        key: &str,
    ) -> Option<Snapshot> {
        self.state.read().snapshots.get(key).cloned()
    }

    /// Replaces the snapshot for `key` and notifies its watches.
    pub fn set_snapshot(
        &self,
        key: &str,
        snapshot: Snapshot,
    ) -> Result<()> {
        snapshot.consistent()?;
        debug!(node = key, version = snapshot.version(), "snapshot set");
        self.state.write().commit(key, snapshot);
        Ok(())
    }

    /// Compare-and-commit under the cache write lock.
    ///
    /// `f` sees the current snapshot and returns the one to commit, or `None`
    /// to leave the entry untouched. Returns the committed snapshot.
    pub fn update<F>(
        &self,
        key: &str,
        f: F,
    ) -> Result<Option<Snapshot>>
    where
        F: FnOnce(Option<&Snapshot>) -> Option<Snapshot>,
    {
        let mut state = self.state.write();
        let Some(candidate) = f(state.snapshots.get(key)) else {
            return Ok(None);
        };
        candidate.consistent()?;
        debug!(node = key, version = candidate.version(), "snapshot committed");
        state.commit(key, candidate.clone());
        Ok(Some(candidate))
    }

    pub fn has_snapshot(
        &self,
        key: &str,
    ) -> bool {
        self.state.read().snapshots.contains_key(key)
    }

    /// Drops the entry for `key` together with its watches.
    ///
    /// Dropped watches see their channel close.
    pub fn clear_snapshot(
        &self,
        key: &str,
    ) {
        let mut state = self.state.write();
        state.snapshots.remove(key);
        state.watches.remove(key);
    }

    pub fn node_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.read().snapshots.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Subscribes to the next snapshot newer than `request.version_info`.
    ///
    /// Answered right away when the cached version already differs, unless
    /// the cached snapshot is empty and the stream has received nothing yet.
    /// The returned handle unregisters the watch when cancelled or dropped.
    pub fn create_watch(
        &self,
        request: WatchRequest,
    ) -> (oneshot::Receiver<WatchResponse>, WatchHandle) {
        let (tx, rx) = oneshot::channel();
        let key = self.hash.id(&request.node);
        let id = self.next_watch_id.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.write();
        if let Some(snapshot) = state.snapshots.get(&key) {
            if answers(&request, snapshot) {
                trace!(node = %key, watch_id = id, version = snapshot.version(), "answering watch immediately");
                let _ = tx.send(respond(&request, snapshot));
                return (rx, WatchHandle::noop(id));
            }
        }

        state
            .watches
            .entry(key.clone())
            .or_default()
            .push(PendingWatch { id, request, tx });
        trace!(node = %key, watch_id = id, "watch registered");

        (
            rx,
            WatchHandle {
                id,
                key: Some(key),
                state: Arc::downgrade(&self.state),
            },
        )
    }

    #[cfg(test)]
    pub(crate) fn pending_watches(
        &self,
        key: &str,
    ) -> usize {
        self.state.read().watches.get(key).map(Vec::len).unwrap_or(0)
    }
}

/// Cancels a watch. Dropping the handle cancels it too.
pub struct WatchHandle {
    id: u64,
    key: Option<String>,
    state: Weak<RwLock<CacheState>>,
}

impl WatchHandle {
    fn noop(id: u64) -> Self {
        Self {
            id,
            key: None,
            state: Weak::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Consumes the handle, which unregisters the watch on drop.
    pub fn cancel(self) {}
}

impl fmt::Debug for WatchHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        let (Some(key), Some(state)) = (self.key.take(), self.state.upgrade()) else {
            return;
        };
        let mut state = state.write();
        if let Some(watches) = state.watches.get_mut(&key) {
            watches.retain(|w| w.id != self.id);
            if watches.is_empty() {
                state.watches.remove(&key);
            }
        }
        trace!(node = %key, watch_id = self.id, "watch unregistered");
    }
}
