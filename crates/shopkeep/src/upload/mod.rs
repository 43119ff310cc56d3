//! Pre-signed uploads against an object store.
//!
//! The server never receives file bytes. [`UploadService::sign_upload`]
//! hands the client a time-limited PUT URL for a key inside the caller's
//! own prefix; delete and list are scoped to that same prefix.

pub mod keys;
mod s3;

#[cfg(test)]
pub mod memory;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use s3::S3ObjectStore;

/// Errors raised by the upload service.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
    #[error("Not allowed to access file: {0}")]
    Forbidden(String),
    #[error("Object store request failed: {0}")]
    Store(String),
}

/// One stored object as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A signed upload handed back to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub upload_url: String,
    pub key: String,
    pub file_url: String,
    pub expires_in: u64,
}

/// Object store operations the upload endpoints rely on.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns a URL accepting a single PUT of `key` with `content_type`.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, UploadError>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), UploadError>;

    /// Lists every object whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, UploadError>;
}

/// Upload operations scoped to the calling user.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    expires_in: Duration,
    public_base_url: String,
}

impl UploadService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        expires_in: Duration,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            expires_in,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Validates the declared upload and signs a PUT URL for a fresh key.
    pub async fn sign_upload(
        &self,
        user_id: Uuid,
        file_name: &str,
        content_type: &str,
        folder: Option<&str>,
    ) -> Result<SignedUpload, UploadError> {
        let content_type = keys::validate_content_type(content_type)?;
        let file_name = keys::sanitize_file_name(file_name)?;
        let folder = keys::folder_or_default(folder);
        let key = keys::object_key(&folder, user_id, &file_name);

        let upload_url = self
            .store
            .presign_put(&key, &content_type, self.expires_in)
            .await?;

        tracing::debug!(%user_id, key = %key, content_type = %content_type, "Signed upload URL");

        Ok(SignedUpload {
            upload_url,
            file_url: format!("{}/{}", self.public_base_url, key),
            key,
            expires_in: self.expires_in.as_secs(),
        })
    }

    /// Deletes one of the caller's objects.
    pub async fn delete(&self, user_id: Uuid, key: &str) -> Result<(), UploadError> {
        keys::authorize_key(key, user_id)?;
        self.store.delete(key).await?;
        tracing::debug!(%user_id, key = %key, "Deleted uploaded file");
        Ok(())
    }

    /// Lists the caller's objects inside `folder`.
    pub async fn list(
        &self,
        user_id: Uuid,
        folder: Option<&str>,
    ) -> Result<Vec<StoredObject>, UploadError> {
        let folder = keys::folder_or_default(folder);
        self.store.list(&keys::user_prefix(&folder, user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryObjectStore;
    use super::*;

    fn service(store: MemoryObjectStore) -> UploadService {
        UploadService::new(
            Arc::new(store),
            Duration::from_secs(300),
            "https://files.example.com/",
        )
    }

    #[tokio::test]
    async fn test_sign_upload_builds_key_and_urls() {
        let store = MemoryObjectStore::new();
        let uploads = service(store.clone());
        let user_id = Uuid::new_v4();

        let signed = uploads
            .sign_upload(user_id, "my photo.png", "image/png", None)
            .await
            .unwrap();

        assert!(signed.key.starts_with(&format!("uploads/{user_id}/")));
        assert!(signed.key.ends_with("-my_photo.png"));
        assert_eq!(
            signed.file_url,
            format!("https://files.example.com/{}", signed.key)
        );
        assert_eq!(signed.expires_in, 300);
        assert!(signed.upload_url.contains(&signed.key));
        assert_eq!(store.signed().await, vec![(signed.key, "image/png".to_string())]);
    }

    #[tokio::test]
    async fn test_sign_upload_rejects_disallowed_content_type() {
        let store = MemoryObjectStore::new();
        let uploads = service(store.clone());

        let result = uploads
            .sign_upload(Uuid::new_v4(), "page.html", "text/html", None)
            .await;

        assert!(matches!(result, Err(UploadError::UnsupportedContentType(_))));
        assert!(store.signed().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_owner() {
        let store = MemoryObjectStore::new();
        let uploads = service(store.clone());
        let owner = Uuid::new_v4();
        let key = format!("uploads/{owner}/abc-photo.png");
        store.insert(&key, 10).await;

        let result = uploads.delete(Uuid::new_v4(), &key).await;
        assert!(matches!(result, Err(UploadError::Forbidden(_))));
        assert_eq!(store.list("").await.unwrap().len(), 1);

        uploads.delete(owner, &key).await.unwrap();
        assert!(store.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_only_returns_callers_objects() {
        let store = MemoryObjectStore::new();
        let uploads = service(store.clone());
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.insert(&format!("uploads/{owner}/a.png"), 1).await;
        store.insert(&format!("avatars/{owner}/b.png"), 2).await;
        store.insert(&format!("uploads/{other}/c.png"), 3).await;

        let files = uploads.list(owner, None).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].key, format!("uploads/{owner}/a.png"));

        let avatars = uploads.list(owner, Some("avatars")).await.unwrap();
        assert_eq!(avatars.len(), 1);
        assert_eq!(avatars[0].size, 2);
    }
}
