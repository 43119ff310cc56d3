use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ObjectStore, StoredObject, UploadError};

/// In-process object store for tests.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    signed: Arc<RwLock<Vec<(String, String)>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: &str, size: i64) {
        let object = StoredObject {
            key: key.to_string(),
            size,
            last_modified: Some(Utc::now()),
        };
        self.objects.write().await.insert(key.to_string(), object);
    }

    /// Every `(key, content_type)` pair signed so far.
    pub async fn signed(&self) -> Vec<(String, String)> {
        self.signed.read().await.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, UploadError> {
        self.signed
            .write()
            .await
            .push((key.to_string(), content_type.to_string()));
        Ok(format!(
            "https://upload.test/{key}?expires={}",
            expires_in.as_secs()
        ))
    }

    async fn delete(&self, key: &str) -> Result<(), UploadError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, UploadError> {
        Ok(self
            .objects
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, object)| object.clone())
            .collect())
    }
}
