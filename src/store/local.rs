//! Filesystem-backed artifact store for development and tests.

use super::ArtifactStore;
use crate::error::{LydtrekkError, Result};
use async_trait::async_trait;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Artifact store that writes to a local directory.
///
/// "Signed" URLs are plain `file://` URLs; the TTL is accepted and ignored.
/// Not meant for production use.
pub struct LocalArtifactStore {
    inner: Arc<LocalFileSystem>,
    root: PathBuf,
    label: String,
}

impl LocalArtifactStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;

        let fs = LocalFileSystem::new_with_prefix(&root)
            .map_err(|e| LydtrekkError::Config(format!("Local store init failed: {e}")))?;
        let label = root.to_string_lossy().into_owned();

        Ok(Self {
            inner: Arc::new(fs),
            root,
            label,
        })
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    fn bucket(&self) -> &str {
        &self.label
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

    async fn sign_read_url(&self, key: &str, _ttl: Duration) -> Result<String> {
        let url = Url::from_file_path(self.root.join(key))
            .map_err(|_| LydtrekkError::Sign(format!("cannot build a file URL for {key}")))?;

        Ok(url.to_string())
    }
}
