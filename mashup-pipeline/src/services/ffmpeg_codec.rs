//! ffmpeg / ffprobe codec backend
//!
//! Decoding goes through symphonia in-process. Encoding and container
//! conversion shell out to ffmpeg, configured with explicit binary paths
//! (no process-wide environment mutation).
//!
//! Canonical output: MP3 (libmp3lame, VBR q2), 44.1 kHz, stereo.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mashup_common::config::ToolPaths;

use crate::error::CodecError;
use crate::models::AudioClip;
use crate::types::{AudioBackend, VideoBackend, VideoHandle};
use crate::utils::audio_decoder::{decode_audio_file, decode_audio_file_head};
use crate::utils::process::{args, run_tool, ToolError};

/// Canonical sample rate (Hz)
pub const CANONICAL_SAMPLE_RATE: u32 = 44_100;

/// Canonical channel count
pub const CANONICAL_CHANNELS: u16 = 2;

const FFMPEG: &str = "ffmpeg";
const FFPROBE: &str = "ffprobe";

/// ffmpeg-backed audio and video codec
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegCodec {
    pub fn new(tools: &ToolPaths) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe(),
        }
    }

    /// Output options shared by every canonical encode
    fn canonical_output_args(dst: &Path) -> Vec<OsString> {
        let mut list = args([
            "-ar".to_string(),
            CANONICAL_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            CANONICAL_CHANNELS.to_string(),
            "-codec:a".to_string(),
            "libmp3lame".to_string(),
            "-q:a".to_string(),
            "2".to_string(),
            "-f".to_string(),
            "mp3".to_string(),
        ]);
        list.push(dst.as_os_str().to_os_string());
        list
    }

    pub fn transcode_args(src: &Path, dst: &Path) -> Vec<OsString> {
        let mut list = args(["-hide_banner", "-loglevel", "error", "-y", "-i"]);
        list.push(src.as_os_str().to_os_string());
        list.push("-vn".into());
        list.extend(Self::canonical_output_args(dst));
        list
    }

    pub fn export_args(sample_rate: u32, channels: u16, dst: &Path) -> Vec<OsString> {
        let mut list = args([
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            "f32le".to_string(),
            "-ar".to_string(),
            sample_rate.to_string(),
            "-ac".to_string(),
            channels.to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
        ]);
        list.extend(Self::canonical_output_args(dst));
        list
    }

    pub fn extract_args(src: &Path, stream_index: u32, dst: &Path) -> Vec<OsString> {
        let mut list = args(["-hide_banner", "-loglevel", "error", "-y", "-i"]);
        list.push(src.as_os_str().to_os_string());
        list.push("-map".into());
        list.push(format!("0:{}", stream_index).into());
        list.push("-vn".into());
        list.extend(Self::canonical_output_args(dst));
        list
    }

    pub fn probe_args(src: &Path) -> Vec<OsString> {
        let mut list = args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=index",
            "-of",
            "csv=p=0",
        ]);
        list.push(src.as_os_str().to_os_string());
        list
    }

    /// Index of the first audio stream in `src`
    fn probe_audio_stream(&self, src: &Path) -> Result<u32, CodecError> {
        let stdout = run_tool(FFPROBE, &self.ffprobe, &Self::probe_args(src), None).map_err(
            |e| match e {
                ToolError::Failed { stderr, .. } => CodecError::Decode {
                    path: src.to_path_buf(),
                    reason: format!("ffprobe failed: {}", stderr),
                },
                other => other.into_codec_error(src),
            },
        )?;

        parse_first_stream_index(&String::from_utf8_lossy(&stdout)).ok_or_else(|| {
            CodecError::Decode {
                path: src.to_path_buf(),
                reason: "no audio track".to_string(),
            }
        })
    }
}

/// First stream index in ffprobe `csv=p=0` output
pub fn parse_first_stream_index(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .filter_map(|line| line.trim().trim_end_matches(',').parse::<u32>().ok())
        .next()
}

fn pcm_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

impl AudioBackend for FfmpegCodec {
    fn name(&self) -> &'static str {
        FFMPEG
    }

    fn load(&self, path: &Path) -> Result<AudioClip, CodecError> {
        decode_audio_file(path)
    }

    fn load_head(&self, path: &Path, max_ms: u64) -> Result<AudioClip, CodecError> {
        decode_audio_file_head(path, max_ms)
    }

    fn export(&self, clip: &AudioClip, path: &Path) -> Result<(), CodecError> {
        if clip.is_empty() {
            return Err(CodecError::Encode {
                path: path.to_path_buf(),
                reason: "no samples to encode".to_string(),
            });
        }

        let input = pcm_bytes(clip.samples());
        run_tool(
            FFMPEG,
            &self.ffmpeg,
            &Self::export_args(clip.sample_rate(), clip.channels(), path),
            Some(&input),
        )
        .map_err(|e| e.into_codec_error(path))?;
        Ok(())
    }

    fn transcode(&self, src: &Path, dst: &Path) -> Result<(), CodecError> {
        run_tool(FFMPEG, &self.ffmpeg, &Self::transcode_args(src, dst), None)
            .map_err(|e| e.into_codec_error(src))?;
        Ok(())
    }
}

/// Probed video container
pub struct FfmpegVideoHandle<'a> {
    codec: &'a FfmpegCodec,
    path: PathBuf,
    audio_stream: u32,
}

impl VideoHandle for FfmpegVideoHandle<'_> {
    fn export_audio(&mut self, dst: &Path) -> Result<(), CodecError> {
        run_tool(
            FFMPEG,
            &self.codec.ffmpeg,
            &FfmpegCodec::extract_args(&self.path, self.audio_stream, dst),
            None,
        )
        .map_err(|e| e.into_codec_error(&self.path))?;
        Ok(())
    }
}

impl Drop for FfmpegVideoHandle<'_> {
    fn drop(&mut self) {
        tracing::trace!(file = %self.path.display(), "Video handle released");
    }
}

impl VideoBackend for FfmpegCodec {
    fn name(&self) -> &'static str {
        FFMPEG
    }

    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn VideoHandle + 'a>, CodecError> {
        let audio_stream = self.probe_audio_stream(path)?;
        tracing::debug!(file = %path.display(), audio_stream, "Opened video container");
        Ok(Box::new(FfmpegVideoHandle {
            codec: self,
            path: path.to_path_buf(),
            audio_stream,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[OsString]) -> Vec<String> {
        list.iter().map(|s| s.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_transcode_args_force_canonical_format() {
        let list = strings(&FfmpegCodec::transcode_args(
            Path::new("in.webm"),
            Path::new("out.mp3.partial"),
        ));
        assert!(list.windows(2).any(|w| w[0] == "-ar" && w[1] == "44100"));
        assert!(list.windows(2).any(|w| w[0] == "-ac" && w[1] == "2"));
        assert!(list.windows(2).any(|w| w[0] == "-f" && w[1] == "mp3"));
        assert!(list.contains(&"-vn".to_string()));
        assert_eq!(list.last().unwrap(), "out.mp3.partial");
    }

    #[test]
    fn test_export_args_describe_pcm_input() {
        let list = strings(&FfmpegCodec::export_args(48000, 1, Path::new("o.mp3")));
        let input = list.iter().position(|a| a == "pipe:0").unwrap();
        let head = &list[..input];
        assert!(head.windows(2).any(|w| w[0] == "-f" && w[1] == "f32le"));
        assert!(head.windows(2).any(|w| w[0] == "-ar" && w[1] == "48000"));
        assert!(head.windows(2).any(|w| w[0] == "-ac" && w[1] == "1"));
    }

    #[test]
    fn test_extract_args_map_stream() {
        let list = strings(&FfmpegCodec::extract_args(Path::new("v.mp4"), 1, Path::new("a.mp3")));
        assert!(list.windows(2).any(|w| w[0] == "-map" && w[1] == "0:1"));
    }

    #[test]
    fn test_parse_first_stream_index() {
        assert_eq!(parse_first_stream_index("1\n2\n"), Some(1));
        assert_eq!(parse_first_stream_index("1,\n"), Some(1));
        assert_eq!(parse_first_stream_index(""), None);
    }

    #[test]
    fn test_pcm_bytes_little_endian() {
        let bytes = pcm_bytes(&[1.0, -0.5]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_missing_ffmpeg_is_systemic() {
        let codec = FfmpegCodec::new(&ToolPaths {
            ffmpeg: PathBuf::from("/nonexistent/bin/ffmpeg"),
            ..ToolPaths::default()
        });
        let err = codec
            .transcode(Path::new("in.webm"), Path::new("out.mp3"))
            .unwrap_err();
        assert!(matches!(err, CodecError::ToolMissing { tool: "ffmpeg", .. }));
        assert!(!err.is_item_failure());
    }
}
