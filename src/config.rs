//! Runtime configuration, supplied via command-line flags or the process
//! environment at startup.

use clap::Parser;
use std::path::PathBuf;

/// Lydtrekk - Audio Extraction Service
///
/// Extracts compressed audio tracks from videos on a remote file host and
/// publishes them to an object store.
#[derive(Parser, Debug, Clone)]
#[command(name = "lydtrekk")]
#[command(version, about, long_about = None)]
pub struct Settings {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Object store bucket that published audio is uploaded to
    #[arg(long, env = "AUDIO_BUCKET")]
    pub bucket: Option<String>,

    /// Publish artifacts to a local directory instead of S3 (development)
    #[arg(long, env = "LOCAL_STORE_DIR")]
    pub local_store_dir: Option<PathBuf>,

    /// Base URL of the file-hosting API
    #[arg(
        long,
        env = "FILE_API_BASE_URL",
        default_value = "https://www.googleapis.com/drive/v3"
    )]
    pub file_api_base: String,

    /// Read-only access token for the file-hosting API
    #[arg(long, env = "FILE_API_TOKEN", hide_env_values = true)]
    pub file_api_token: Option<String>,

    /// Root directory for per-request working directories
    #[arg(long, env = "WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Settings {
    /// Root under which per-request working directories are created.
    pub fn work_root(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("lydtrekk"))
    }
}
