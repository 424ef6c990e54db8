use crate::error::{ReleaseError, Result};
use crate::record::ReleaseRecord;
use crate::{lookup_key, validate_key, ReleaseStore, LATEST_KEY};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store with the same contract as [`crate::FileStore`].
pub struct MemoryStore {
    records: RwLock<HashMap<String, ReleaseRecord>>,
    latest: RwLock<Option<ReleaseRecord>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            latest: RwLock::new(None),
        }
    }
}

#[async_trait]
impl ReleaseStore for MemoryStore {
    async fn put(&self, version: &str, record: &ReleaseRecord) -> Result<()> {
        validate_key(version)?;
        let mut records = self.records.write().await;
        records.insert(version.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, version: &str) -> Result<ReleaseRecord> {
        lookup_key(version)?;
        let records = self.records.read().await;
        records
            .get(version)
            .cloned()
            .ok_or_else(|| ReleaseError::not_found(version))
    }

    async fn list(&self) -> Result<Vec<(String, ReleaseRecord)>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect())
    }

    async fn delete(&self, version: &str) -> Result<()> {
        lookup_key(version)?;
        let mut records = self.records.write().await;
        records
            .remove(version)
            .map(|_| ())
            .ok_or_else(|| ReleaseError::not_found(version))
    }

    async fn get_latest(&self) -> Result<ReleaseRecord> {
        let latest = self.latest.read().await;
        latest
            .clone()
            .ok_or_else(|| ReleaseError::not_found(LATEST_KEY))
    }

    async fn set_latest(&self, record: &ReleaseRecord) -> Result<()> {
        let mut latest = self.latest.write().await;
        *latest = Some(record.clone());
        Ok(())
    }
}
