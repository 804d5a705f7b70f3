//! S3-compatible artifact store.

use super::ArtifactStore;
use crate::error::{LydtrekkError, Result};
use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as StorePath;
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Artifact store backed by an S3-compatible bucket.
///
/// Credentials, region, and endpoint come from the process environment; only
/// the bucket name is part of service configuration.
pub struct S3ArtifactStore {
    inner: Arc<AmazonS3>,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(bucket: &str) -> Result<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| LydtrekkError::Config(format!("S3 store init failed: {e}")))?;

        Ok(Self {
            inner: Arc::new(store),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<()> {
        let bytes = tokio::fs::read(local_path).await?;
        let location = StorePath::from(key);

        self.inner
            .put(&location, PutPayload::from(bytes))
            .await
            .map_err(|e| LydtrekkError::Upload(e.to_string()))?;

        Ok(())
    }

    async fn sign_read_url(&self, key: &str, ttl: Duration) -> Result<String> {
        let location = StorePath::from(key);
        let url = self
            .inner
            .signed_url(Method::GET, &location, ttl)
            .await
            .map_err(|e| LydtrekkError::Sign(e.to_string()))?;

        Ok(url.to_string())
    }
}
