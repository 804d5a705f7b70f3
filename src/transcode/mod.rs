//! Audio extraction via external media tools.
//!
//! The conversion itself is delegated to ffmpeg, invoked as a subprocess with
//! an explicit argument vector. Identifier-derived paths never pass through a
//! shell.

mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
/// Default channel count.
pub const DEFAULT_CHANNELS: u32 = 1;
/// Default bitrate in kbps (ignored for wav output).
pub const DEFAULT_BITRATE_K: u32 = 32;

/// Supported output formats for extracted audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    /// Opus in an Ogg container.
    #[default]
    Ogg,
    Mp3,
    /// Uncompressed 16-bit PCM.
    Wav,
}

impl AudioFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Ogg => "ogg",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ogg" => Ok(AudioFormat::Ogg),
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            _ => Err(format!("Unknown audio format: {}", s)),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Parameters for one audio extraction.
#[derive(Debug, Clone)]
pub struct AudioOptions {
    pub format: AudioFormat,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u32,
    /// Bitrate in kbps; ignored for wav output.
    pub bitrate_k: u32,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            format: AudioFormat::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            bitrate_k: DEFAULT_BITRATE_K,
        }
    }
}

/// Trait for converting a source media file into an audio file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert `input` into an audio file at `output` per `options`.
    async fn transcode(&self, input: &Path, output: &Path, options: &AudioOptions) -> Result<()>;

    /// Best-effort duration probe in seconds.
    ///
    /// Returns `None` on any failure; a missing duration never fails the
    /// surrounding request.
    async fn probe_duration(&self, input: &Path) -> Option<f64>;
}
