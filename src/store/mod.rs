//! Topology store contract.
//!
//! Health discovery reads proxy records and writes back per-inbound readiness.
//! Everything else about the records is owned elsewhere.

mod memory;
pub use memory::*;

#[cfg(test)]
mod memory_test;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::Dataplane;
use crate::ResourceKey;
use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceStore: Send + Sync + 'static {
    /// Fetches the record stored under `key`.
    ///
    /// # Errors
    /// `StoreError::ProxyNotFound` if there is none.
    async fn get(
        &self,
        key: &ResourceKey,
    ) -> Result<Dataplane>;

    /// Replaces the stored record if `record.version` still matches.
    ///
    /// Returns the stored record carrying its new version.
    ///
    /// # Errors
    /// `StoreError::StoreWriteConflict` when the stored version moved on,
    /// `StoreError::ProxyNotFound` when the record was removed.
    async fn update(
        &self,
        record: Dataplane,
    ) -> Result<Dataplane>;

    async fn list(&self) -> Result<Vec<Dataplane>>;
}
