//! ffmpeg-backed transcoder implementation.

use super::{AudioFormat, AudioOptions, Transcoder};
use crate::error::{LydtrekkError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Transcoder that shells out to `ffmpeg` and `ffprobe`.
pub struct FfmpegTranscoder;

/// Assemble the ffmpeg argument vector for one conversion.
///
/// Video is always dropped (`-vn`); the codec arguments depend on the target
/// format. The tool's own output is limited to errors.
fn build_args(input: &Path, output: &Path, options: &AudioOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        input.as_os_str().to_os_string(),
        "-vn".into(),
        "-ac".into(),
        options.channels.to_string().into(),
        "-ar".into(),
        options.sample_rate.to_string().into(),
    ];

    match options.format {
        AudioFormat::Ogg => {
            args.extend([
                "-c:a".into(),
                "libopus".into(),
                "-b:a".into(),
                format!("{}k", options.bitrate_k).into(),
            ]);
        }
        AudioFormat::Mp3 => {
            args.extend([
                "-c:a".into(),
                "libmp3lame".into(),
                "-b:a".into(),
                format!("{}k", options.bitrate_k).into(),
            ]);
        }
        AudioFormat::Wav => {
            args.extend(["-c:a".into(), "pcm_s16le".into()]);
        }
    }

    args.extend([
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        output.as_os_str().to_os_string(),
    ]);

    args
}

/// Pull `format.duration` out of ffprobe's JSON output.
///
/// ffprobe reports the duration as a string; a numeric value is accepted too.
fn parse_probe_duration(probe: &serde_json::Value) -> Option<f64> {
    let duration = &probe["format"]["duration"];
    duration
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| duration.as_f64())
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, options: &AudioOptions) -> Result<()> {
        let args = build_args(input, output, options);
        debug!("Running ffmpeg for {:?}", output);

        let result = Command::new("ffmpeg")
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                Err(LydtrekkError::Transcode(format!(
                    "ffmpeg failed: {}",
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LydtrekkError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(LydtrekkError::Transcode(format!(
                "ffmpeg execution failed: {e}"
            ))),
        }
    }

    async fn probe_duration(&self, input: &Path) -> Option<f64> {
        let result = Command::new("ffprobe")
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(input)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        let output = match result {
            Ok(o) if o.status.success() => o,
            Ok(_) => {
                debug!("ffprobe returned an error for {:?}", input);
                return None;
            }
            Err(e) => {
                debug!("ffprobe unavailable: {}", e);
                return None;
            }
        };

        let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
        parse_probe_duration(&parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args_as_strings(options: &AudioOptions) -> Vec<String> {
        build_args(Path::new("/work/input.bin"), Path::new("/work/audio.out"), options)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_build_args_ogg() {
        let args = args_as_strings(&AudioOptions::default());

        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "/work/input.bin");
        assert!(args.contains(&"-vn".to_string()));
        assert!(has_pair(&args, "-ac", "1"));
        assert!(has_pair(&args, "-ar", "16000"));
        assert!(has_pair(&args, "-c:a", "libopus"));
        assert!(has_pair(&args, "-b:a", "32k"));
        assert_eq!(args.last().map(String::as_str), Some("/work/audio.out"));
    }

    #[test]
    fn test_build_args_mp3() {
        let options = AudioOptions {
            format: AudioFormat::Mp3,
            sample_rate: 44_100,
            channels: 2,
            bitrate_k: 64,
        };
        let args = args_as_strings(&options);

        assert!(has_pair(&args, "-c:a", "libmp3lame"));
        assert!(has_pair(&args, "-b:a", "64k"));
        assert!(has_pair(&args, "-ac", "2"));
        assert!(has_pair(&args, "-ar", "44100"));
    }

    #[test]
    fn test_build_args_wav_ignores_bitrate() {
        let options = AudioOptions {
            format: AudioFormat::Wav,
            ..AudioOptions::default()
        };
        let args = args_as_strings(&options);

        assert!(has_pair(&args, "-c:a", "pcm_s16le"));
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_parse_probe_duration() {
        let probe = json!({"format": {"duration": "2.000000"}});
        assert_eq!(parse_probe_duration(&probe), Some(2.0));

        let probe = json!({"format": {"duration": 3.5}});
        assert_eq!(parse_probe_duration(&probe), Some(3.5));

        assert_eq!(parse_probe_duration(&json!({"format": {}})), None);
        assert_eq!(parse_probe_duration(&json!({})), None);
        assert_eq!(
            parse_probe_duration(&json!({"format": {"duration": "abc"}})),
            None
        );
    }
}
