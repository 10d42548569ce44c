use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;

use crate::ProtocolError;

/// Process-wide stream counter. Starts at 1 so 0 never names a stream.
static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Handle for one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u64);

impl StreamId {
    /// Allocates the next process-unique id.
    pub fn next() -> Self {
        Self(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for StreamId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for StreamId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `{mesh, name}` of a proxy, parsed from a wire node id `"<mesh>.<name>"`.
///
/// Only the first `.` separates the mesh; names may contain dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProxyIdentity {
    pub mesh: String,
    pub name: String,
}

/// Topology store key. A proxy's store key is its identity.
pub type ResourceKey = ProxyIdentity;

impl ProxyIdentity {
    pub fn new(
        mesh: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            mesh: mesh.into(),
            name: name.into(),
        }
    }

    pub fn parse(node_id: &str) -> Result<Self, ProtocolError> {
        match node_id.split_once('.') {
            Some((mesh, name)) if !mesh.is_empty() && !name.is_empty() => Ok(Self::new(mesh, name)),
            _ => Err(ProtocolError::MalformedNodeId(node_id.to_string())),
        }
    }

    /// Wire form, the inverse of [`ProxyIdentity::parse`].
    pub fn node_id(&self) -> String {
        self.to_string()
    }
}

impl FromStr for ProxyIdentity {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProxyIdentity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}.{}", self.mesh, self.name)
    }
}
