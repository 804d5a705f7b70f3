//! Drive-style file host implementation.
//!
//! Downloads file content via `GET {base}/files/{id}?alt=media` with an
//! optional read-only bearer token.

use super::FileFetcher;
use crate::error::{LydtrekkError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

/// Fetcher for a Drive-style file-hosting API.
pub struct DriveFetcher {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl DriveFetcher {
    /// Create a fetcher against `base_url`, optionally authenticating with a
    /// read-only bearer `token`.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| LydtrekkError::Config(format!("Invalid file API base URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(LydtrekkError::Config(format!(
                "File API base URL is not usable as a base: {base_url}"
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base,
            token,
        })
    }

    /// Build the media-download URL for a file ID.
    ///
    /// The ID goes into the URL as a single path segment, so identifiers
    /// containing separators or other reserved characters are percent-encoded
    /// rather than interpreted.
    fn media_url(&self, file_id: &str) -> Url {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .expect("base URL validated in constructor")
            .pop_if_empty()
            .push("files")
            .push(file_id);
        url.query_pairs_mut().append_pair("alt", "media");
        url
    }
}

#[async_trait]
impl FileFetcher for DriveFetcher {
    async fn fetch(&self, file_id: &str, dest: &Path) -> Result<u64> {
        let url = self.media_url(file_id);
        debug!("Downloading {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LydtrekkError::UpstreamFetch(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LydtrekkError::UpstreamFetch(format!(
                "file host returned {} for {}",
                response.status(),
                file_id
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk
                .map_err(|e| LydtrekkError::UpstreamFetch(format!("download stream failed: {e}")))?;
            file.write_all(&bytes).await?;
            written += bytes.len() as u64;
        }

        file.flush().await?;
        info!("Downloaded {} ({} bytes)", file_id, written);

        Ok(written)
    }
}
