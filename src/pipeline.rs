//! Per-request extraction pipeline.
//!
//! Coordinates the linear sequence fetch → probe → transcode → publish. Each
//! request stages its files in a working directory that is removed on every
//! exit path, including failures.

use crate::error::{LydtrekkError, Result};
use crate::fetch::FileFetcher;
use crate::store::ArtifactStore;
use crate::transcode::{AudioFormat, AudioOptions, Transcoder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// How long signed download links stay valid.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// A single extraction request, normalized from the wire format.
///
/// Numeric fields are already defaulted by the HTTP layer; the format is kept
/// as the raw client string so an unsupported value fails at the transcode
/// stage rather than during parsing.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub file_id: String,
    pub format: String,
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate_k: u32,
}

/// Success response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub file_id: String,
    pub audio_url: String,
    pub meta: ExtractionMeta,
}

/// Diagnostic metadata attached to a successful extraction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMeta {
    pub format: String,
    pub input_bytes: u64,
    pub audio_bytes: u64,
    pub duration_sec: Option<f64>,
    pub elapsed_ms: u64,
    pub bucket: String,
    pub destination: String,
}

/// The per-request orchestrator.
///
/// Holds the process-wide collaborators, all created once at startup and
/// shared read-only across requests.
pub struct Extractor {
    fetcher: Arc<dyn FileFetcher>,
    transcoder: Arc<dyn Transcoder>,
    store: Option<Arc<dyn ArtifactStore>>,
    work_root: PathBuf,
}

impl Extractor {
    pub fn new(
        fetcher: Arc<dyn FileFetcher>,
        transcoder: Arc<dyn Transcoder>,
        store: Option<Arc<dyn ArtifactStore>>,
        work_root: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            transcoder,
            store,
            work_root,
        }
    }

    /// Run the full pipeline for one request.
    ///
    /// Validation failures surface before the working directory exists; the
    /// store check runs before any fetch; the unsupported-format check runs
    /// before any subprocess is spawned.
    #[instrument(skip(self, request), fields(file_id = %request.file_id))]
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        let started = Instant::now();

        if request.file_id.is_empty() {
            return Err(LydtrekkError::MissingFileId);
        }
        let store = self
            .store
            .as_ref()
            .ok_or(LydtrekkError::StoreNotConfigured)?;

        let workdir = WorkDir::create(&self.work_root, &request.file_id)?;
        let input_path = workdir.path().join("input.bin");

        info!("Fetching {}", request.file_id);
        let input_bytes = self.fetcher.fetch(&request.file_id, &input_path).await?;

        let format: AudioFormat = request
            .format
            .parse()
            .map_err(|_| LydtrekkError::UnsupportedFormat(request.format.clone()))?;

        let duration_sec = self.transcoder.probe_duration(&input_path).await;

        let options = AudioOptions {
            format,
            sample_rate: request.sample_rate,
            channels: request.channels,
            bitrate_k: request.bitrate_k,
        };
        let output_path = workdir.path().join(format!("audio.{}", format.extension()));

        info!("Transcoding to {}", format);
        self.transcoder
            .transcode(&input_path, &output_path, &options)
            .await?;

        let audio_bytes = tokio::fs::metadata(&output_path).await?.len();

        let destination = format!("audio/{}.{}", request.file_id, format.extension());
        info!("Publishing {}", destination);
        store.upload(&output_path, &destination).await?;
        let audio_url = store.sign_read_url(&destination, SIGNED_URL_TTL).await?;

        info!(
            "Extracted {} -> {} ({} bytes in {} ms)",
            request.file_id,
            destination,
            audio_bytes,
            started.elapsed().as_millis()
        );

        Ok(ExtractionResult {
            file_id: request.file_id.clone(),
            audio_url,
            meta: ExtractionMeta {
                format: format.to_string(),
                input_bytes,
                audio_bytes,
                duration_sec,
                elapsed_ms: started.elapsed().as_millis() as u64,
                bucket: store.bucket().to_string(),
                destination,
            },
        })
    }
}

/// Request-scoped working directory, removed when dropped.
///
/// The path is keyed deterministically by file ID, so concurrent requests for
/// the same ID share it. That interleaving is a known hazard of the keying
/// scheme; the published artifact key stays deterministic in exchange.
struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    fn create(root: &Path, file_id: &str) -> std::io::Result<Self> {
        let path = root.join(dir_name(file_id));
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove working directory {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Directory name for a file ID.
///
/// Deterministic: the same ID always maps to the same directory. Characters
/// that could act as path separators or relative components are replaced so
/// an identifier cannot escape the work root.
fn dir_name(file_id: &str) -> String {
    file_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFetcher {
        payload: Option<Vec<u8>>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn ok(payload: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                payload: Some(payload.to_vec()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                payload: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl FileFetcher for StubFetcher {
        async fn fetch(&self, _file_id: &str, dest: &Path) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.payload {
                Some(bytes) => {
                    tokio::fs::write(dest, bytes).await?;
                    Ok(bytes.len() as u64)
                }
                None => Err(LydtrekkError::UpstreamFetch("stub failure".into())),
            }
        }
    }

    struct CopyTranscoder {
        calls: AtomicUsize,
    }

    impl CopyTranscoder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transcoder for CopyTranscoder {
        async fn transcode(
            &self,
            input: &Path,
            output: &Path,
            _options: &AudioOptions,
        ) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::fs::copy(input, output).await?;
            Ok(())
        }

        async fn probe_duration(&self, _input: &Path) -> Option<f64> {
            Some(2.0)
        }
    }

    struct MemoryStore;

    #[async_trait]
    impl ArtifactStore for MemoryStore {
        fn bucket(&self) -> &str {
            "test-bucket"
        }

        async fn upload(&self, _local_path: &Path, _key: &str) -> Result<()> {
            Ok(())
        }

        async fn sign_read_url(&self, key: &str, _ttl: Duration) -> Result<String> {
            Ok(format!("https://store.example/test-bucket/{key}?sig=stub"))
        }
    }

    fn request(file_id: &str, format: &str) -> ExtractionRequest {
        ExtractionRequest {
            file_id: file_id.to_string(),
            format: format.to_string(),
            sample_rate: 16_000,
            channels: 1,
            bitrate_k: 32,
        }
    }

    fn extractor_with(
        fetcher: Arc<StubFetcher>,
        transcoder: Arc<CopyTranscoder>,
        store: bool,
        root: &Path,
    ) -> Extractor {
        let store: Option<Arc<dyn ArtifactStore>> = store.then(|| Arc::new(MemoryStore) as _);
        Extractor::new(fetcher, transcoder, store, root.to_path_buf())
    }

    #[tokio::test]
    async fn test_missing_file_id_fails_without_workdir() {
        let root = tempfile::tempdir().unwrap();
        let extractor = extractor_with(StubFetcher::ok(b"video"), CopyTranscoder::new(), true, root.path());

        let err = extractor.extract(&request("", "ogg")).await.unwrap_err();

        assert!(matches!(err, LydtrekkError::MissingFileId));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_store_fails_before_fetch() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::ok(b"video");
        let extractor = extractor_with(fetcher.clone(), CopyTranscoder::new(), false, root.path());

        let err = extractor.extract(&request("abc123", "ogg")).await.unwrap_err();

        assert!(matches!(err, LydtrekkError::StoreNotConfigured));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_extraction_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let extractor = extractor_with(StubFetcher::ok(b"video bytes"), CopyTranscoder::new(), true, root.path());

        let result = extractor.extract(&request("abc123", "ogg")).await.unwrap();

        assert_eq!(result.file_id, "abc123");
        assert_eq!(result.meta.format, "ogg");
        assert_eq!(result.meta.input_bytes, 11);
        assert!(result.meta.audio_bytes > 0);
        assert_eq!(result.meta.duration_sec, Some(2.0));
        assert_eq!(result.meta.bucket, "test-bucket");
        assert_eq!(result.meta.destination, "audio/abc123.ogg");
        assert!(result.audio_url.contains("audio/abc123.ogg"));
        assert!(!root.path().join("abc123").exists());
    }

    #[tokio::test]
    async fn test_unsupported_format_fails_before_transcode() {
        let root = tempfile::tempdir().unwrap();
        let transcoder = CopyTranscoder::new();
        let extractor = extractor_with(StubFetcher::ok(b"video"), transcoder.clone(), true, root.path());

        let err = extractor.extract(&request("abc123", "xyz")).await.unwrap_err();

        assert!(matches!(err, LydtrekkError::UnsupportedFormat(ref f) if f == "xyz"));
        assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
        assert!(!root.path().join("abc123").exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let extractor = extractor_with(StubFetcher::failing(), CopyTranscoder::new(), true, root.path());

        let err = extractor.extract(&request("abc123", "ogg")).await.unwrap_err();

        assert!(matches!(err, LydtrekkError::UpstreamFetch(_)));
        assert!(!root.path().join("abc123").exists());
    }

    #[tokio::test]
    async fn test_wav_extension_follows_format() {
        let root = tempfile::tempdir().unwrap();
        let extractor = extractor_with(StubFetcher::ok(b"video"), CopyTranscoder::new(), true, root.path());

        let result = extractor.extract(&request("abc123", "wav")).await.unwrap();

        assert_eq!(result.meta.format, "wav");
        assert_eq!(result.meta.destination, "audio/abc123.wav");
    }

    #[test]
    fn test_dir_name_is_path_safe() {
        assert_eq!(dir_name("abc123"), "abc123");
        assert_eq!(dir_name("a/b\\c"), "a_b_c");
        assert_eq!(dir_name(".."), "__");
        assert_eq!(dir_name("id with spaces"), "id_with_spaces");
    }

    #[test]
    fn test_workdir_cleanup_is_idempotent() {
        let root = tempfile::tempdir().unwrap();

        let workdir = WorkDir::create(root.path(), "abc123").unwrap();
        std::fs::write(workdir.path().join("input.bin"), b"data").unwrap();
        let path = workdir.path().to_path_buf();

        // Removing the directory out from under the guard must not panic on drop.
        std::fs::remove_dir_all(&path).unwrap();
        drop(workdir);
        assert!(!path.exists());

        let workdir = WorkDir::create(root.path(), "abc123").unwrap();
        let path = workdir.path().to_path_buf();
        drop(workdir);
        assert!(!path.exists());
    }
}
