//! [`ObjectStore`] backed by an S3 bucket.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::DateTime as S3DateTime;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

use super::{ObjectStore, StoredObject, UploadError};

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    acl: ObjectCannedAcl,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>, acl: &str) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            acl: ObjectCannedAcl::from(acl),
        }
    }

    /// Connects with the default AWS credential chain.
    pub async fn connect(bucket: impl Into<String>, acl: &str) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, acl)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn store_error(operation: &str, err: impl std::fmt::Debug + std::fmt::Display) -> UploadError {
    tracing::error!(operation, error = ?err, "S3 request failed");
    UploadError::Store(format!("{operation}: {err}"))
}

fn to_chrono(timestamp: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, UploadError> {
        let presigning =
            PresigningConfig::expires_in(expires_in).map_err(|e| store_error("presign", e))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .acl(self.acl.clone())
            .presigned(presigning)
            .await
            .map_err(|e| store_error("presign", e))?;

        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), UploadError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| store_error("delete_object", e))?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, UploadError> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let result = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| store_error("list_objects_v2", e))?;

            objects.extend(result.contents().iter().filter_map(|object| {
                Some(StoredObject {
                    key: object.key()?.to_string(),
                    size: object.size().unwrap_or_default(),
                    last_modified: object.last_modified().and_then(to_chrono),
                })
            }));

            match result.next_continuation_token() {
                Some(token) if result.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(objects)
    }
}
