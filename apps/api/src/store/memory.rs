use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, VersionStore};
use crate::models::resume::{Document, ResumeRecord, StoredVersion, VersionFilter, VersionType};

/// Process-local store. Selected when no database is configured; also the
/// store behind the service and router tests.
#[derive(Default)]
pub struct MemoryVersionStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<Uuid, ResumeRecord>,
    /// Append order per resume; the last matching entry is the latest.
    versions: HashMap<Uuid, Vec<StoredVersion>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn create_resume(&self, raw_text: &str) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let record = ResumeRecord {
            id,
            raw_text: raw_text.to_string(),
            created_at: Utc::now(),
        };
        self.inner.write().await.records.insert(id, record);
        Ok(id)
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRecord>, StoreError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn save_version(
        &self,
        id: Uuid,
        document: &Document,
        version_type: VersionType,
    ) -> Result<(), StoreError> {
        let content =
            serde_json::to_value(document).map_err(|e| StoreError::Malformed(e.to_string()))?;

        let mut inner = self.inner.write().await;
        if !inner.records.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        inner.versions.entry(id).or_default().push(StoredVersion {
            resume_id: id,
            content,
            version_type: version_type.as_str().to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn latest_version(
        &self,
        id: Uuid,
        filter: VersionFilter,
    ) -> Result<Option<StoredVersion>, StoreError> {
        let inner = self.inner.read().await;
        let latest = inner.versions.get(&id).and_then(|versions| {
            versions
                .iter()
                .rev()
                .find(|v| match filter {
                    VersionFilter::Latest => true,
                    VersionFilter::Only(t) => v.version_type == t.as_str(),
                })
                .cloned()
        });
        Ok(latest)
    }
}
