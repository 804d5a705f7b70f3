//! Artifact publishing.
//!
//! Extracted audio is uploaded to an object store and handed back to callers
//! as a time-limited signed read URL. The production backend is S3; a local
//! filesystem backend exists for development and tests.

mod local;
mod s3;

pub use local::LocalArtifactStore;
pub use s3::S3ArtifactStore;

use crate::config::Settings;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Trait for publishing local files to an object store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Bucket or container this store publishes to.
    fn bucket(&self) -> &str;

    /// Upload the file at `local_path` under `key`.
    ///
    /// Single-shot and non-resumable; the artifact is small and cheap to
    /// reproduce.
    async fn upload(&self, local_path: &Path, key: &str) -> Result<()>;

    /// Issue a read-only URL for `key`, valid for `ttl` from now.
    async fn sign_read_url(&self, key: &str, ttl: Duration) -> Result<String>;
}

/// Select a store backend from settings.
///
/// A local directory override wins over S3. With neither configured the
/// service still starts; extraction requests then fail with a configuration
/// error.
pub fn from_settings(settings: &Settings) -> Result<Option<Arc<dyn ArtifactStore>>> {
    if let Some(dir) = &settings.local_store_dir {
        let store = LocalArtifactStore::new(dir.clone())?;
        return Ok(Some(Arc::new(store)));
    }

    match &settings.bucket {
        Some(bucket) => Ok(Some(Arc::new(S3ArtifactStore::new(bucket)?))),
        None => Ok(None),
    }
}
