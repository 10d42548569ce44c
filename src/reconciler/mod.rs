
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;
use tracing::debug;
use tracing::trace;

use crate::next_version;
use crate::proto::hds::Node;
use crate::ProxyIdentity;
use crate::Result;
use crate::Snapshot;
use crate::SnapshotCache;
use crate::SnapshotGenerator;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    /// Regenerates the node's snapshot and commits it if its content changed.
    ///
    /// Returns `true` when a new version was committed.
    async fn reconcile(
        &self,
        node: &Node,
    ) -> Result<bool>;

    /// Replaces the node's entry with an empty snapshot.
    fn clear(
        &self,
        node: &Node,
    ) -> Result<()>;
}

/// [`Reconciler`] over a generator and the shared cache.
///
/// The cache lock is the only serialization point: the compare and the
/// commit happen inside one [`SnapshotCache::update`] call.
pub struct SnapshotReconciler {
    generator: Arc<dyn SnapshotGenerator>,
    cache: Arc<SnapshotCache>,
}

impl SnapshotReconciler {
    pub fn new(
        generator: Arc<dyn SnapshotGenerator>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self { generator, cache }
    }
}

#[async_trait]
impl Reconciler for SnapshotReconciler {
    async fn reconcile(
        &self,
        node: &Node,
    ) -> Result<bool> {
        let proxy = ProxyIdentity::parse(&node.id)?;
        let candidate = self.generator.generate_snapshot(&proxy).await?;
        candidate.consistent()?;

        let key = self.cache.node_key(node);
        let committed = self.cache.update(&key, |current| {
            if current == Some(&candidate) {
                return None;
            }
            Some(candidate.clone().with_version(next_version(current)))
        })?;

        match committed {
            Some(snapshot) => {
                debug!(proxy = %proxy, version = snapshot.version(), "health check configuration changed");
                Ok(true)
            }
            None => {
                trace!(proxy = %proxy, "health check configuration unchanged");
                Ok(false)
            }
        }
    }

    fn clear(
        &self,
        node: &Node,
    ) -> Result<()> {
        let key = self.cache.node_key(node);
        self.cache.update(&key, |current| match current {
            Some(snapshot) if snapshot.is_empty() => None,
            _ => Some(Snapshot::empty().with_version(next_version(current))),
        })?;
        debug!(node = %key, "snapshot cleared");
        Ok(())
    }
}
