use std::path::Path;

use dashmap::DashMap;
use serde::Deserialize;
use tonic::async_trait;
use tracing::debug;
use tracing::info;

use super::ResourceStore;
use crate::Dataplane;
use crate::ResourceKey;
use crate::Result;
use crate::StoreError;

/// Layout of a bootstrap file: a list of `[[dataplane]]` tables.
#[derive(Debug, Deserialize, Default)]
struct BootstrapFile {
    #[serde(default)]
    dataplane: Vec<Dataplane>,
}

/// Process-local [`ResourceStore`] with optimistic versioning.
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    records: DashMap<ResourceKey, Dataplane>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store seeded from a TOML bootstrap file.
    pub fn from_bootstrap_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(StoreError::Io)?;
        let store = Self::from_bootstrap_str(&content)?;
        info!("loaded {} proxy records from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn from_bootstrap_str(content: &str) -> Result<Self> {
        let file: BootstrapFile = toml::from_str(content).map_err(StoreError::Decode)?;
        let store = Self::new();
        for record in file.dataplane {
            store.insert(record);
        }
        Ok(store)
    }

    /// Creates or overwrites a record, ignoring its version.
    ///
    /// The stored version is bumped past any previous one.
    pub fn insert(
        &self,
        mut record: Dataplane,
    ) -> Dataplane {
        let key = record.key();
        let previous = self.records.get(&key).map(|r| r.version).unwrap_or(0);
        record.version = previous.max(record.version) + 1;
        self.records.insert(key, record.clone());
        record
    }

    pub fn remove(
        &self,
        key: &ResourceKey,
    ) -> Option<Dataplane> {
        self.records.remove(key).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn get(
        &self,
        key: &ResourceKey,
    ) -> Result<Dataplane> {
        self.records
            .get(key)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::ProxyNotFound(key.clone()).into())
    }

    async fn update(
        &self,
        mut record: Dataplane,
    ) -> Result<Dataplane> {
        let key = record.key();
        let mut stored = self
            .records
            .get_mut(&key)
            .ok_or_else(|| StoreError::ProxyNotFound(key.clone()))?;

        if stored.version != record.version {
            return Err(StoreError::StoreWriteConflict {
                key,
                expected: record.version,
                actual: stored.version,
            }
            .into());
        }

        record.version += 1;
        *stored = record.clone();
        debug!(proxy = %key, version = record.version, "record updated");
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<Dataplane>> {
        let mut records: Vec<Dataplane> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(records)
    }
}
