//! Versioned per-proxy snapshots and the cache that hands them to streams.
//!
//! A [`Snapshot`] is what one proxy should be probing. The [`SnapshotCache`]
//! keeps the latest one per node key and answers watches: a stream asks for
//! "anything newer than version X" and is told once such a snapshot exists.

mod snapshot;
mod snapshot_cache;
pub use snapshot::*;
pub use snapshot_cache::*;

#[cfg(test)]
mod snapshot_cache_test;
