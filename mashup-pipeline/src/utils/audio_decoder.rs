//! Audio Decoding Utilities
//!
//! **Purpose:** Decode canonical stage files to interleaved f32 PCM
//!
//! Uses symphonia for format-agnostic decoding (MP3, WAV, FLAC, etc.). Unlike
//! analysis-oriented decoders, channels are kept as they are so the merge can
//! write the samples back out unchanged.

use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::CodecError;
use crate::models::AudioClip;

/// Decode an audio file into an [`AudioClip`]
///
/// **Algorithm:**
/// 1. Probe the container (extension used as hint)
/// 2. Pick the first track with a known codec
/// 3. Decode every packet of that track into interleaved f32
/// 4. Skip packets that fail to decode (corrupt frames are common in MP3)
///
/// # Errors
/// * `Io` when the file cannot be opened
/// * `Decode` for unsupported formats, missing tracks, or a file that yields
///   no samples at all
pub fn decode_audio_file(file_path: &Path) -> Result<AudioClip, CodecError> {
    decode(file_path, None)
}

/// Decode only the start of an audio file
///
/// Stops reading packets once more than `max_ms` has been decoded and keeps
/// exactly one frame past `max_ms`, so [`AudioClip::is_longer_than_ms`] on the
/// result tells whether the file goes on. Files no longer than `max_ms` come
/// back whole. Memory stays bounded by `max_ms` plus one packet.
pub fn decode_audio_file_head(file_path: &Path, max_ms: u64) -> Result<AudioClip, CodecError> {
    decode(file_path, Some(max_ms))
}

fn decode(file_path: &Path, max_ms: Option<u64>) -> Result<AudioClip, CodecError> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let decode_err = |reason: String| CodecError::Decode {
        path: file_path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(file_path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let format_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &MetadataOptions::default())
        .map_err(|e| decode_err(format!("probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no audio track found".to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("no decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;
    // Frames to keep when only the head is wanted; known after the first packet
    let mut keep_frames: Option<usize> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_err(format!("error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                tracing::trace!(
                    path = %file_path.display(),
                    error = %e,
                    "Skipping undecodable packet"
                );
                continue;
            }
            Err(e) => return Err(decode_err(format!("decode failed: {}", e))),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count() as u16);

        // Reallocate only when a packet is larger than any seen before
        let needed = decoded.capacity() as u64;
        let too_small = sample_buf.as_ref().map_or(true, |buf| {
            (buf.capacity() as u64) < needed * spec.channels.count() as u64
        });
        if too_small {
            sample_buf = Some(SampleBuffer::<f32>::new(needed, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }

        if let Some(max_ms) = max_ms {
            let rate = sample_rate.unwrap_or(spec.rate) as u64;
            let channel_count = channels.unwrap_or(spec.channels.count() as u16) as usize;
            let keep = *keep_frames
                .get_or_insert((max_ms.saturating_mul(rate) / 1000) as usize + 1);
            if samples.len() >= keep * channel_count {
                samples.truncate(keep * channel_count);
                tracing::trace!(
                    path = %file_path.display(),
                    max_ms,
                    "Head decoded, stopping early"
                );
                break;
            }
        }
    }

    let (sample_rate, channels) = match (sample_rate, channels) {
        (Some(rate), Some(channels)) => (rate, channels),
        _ => return Err(decode_err("sample rate or channel layout unknown".to_string())),
    };

    if samples.is_empty() {
        return Err(decode_err("no audio samples decoded".to_string()));
    }

    let clip = AudioClip::new(samples, sample_rate, channels);

    tracing::debug!(
        path = %file_path.display(),
        sample_rate,
        channels,
        skipped_packets,
        duration_seconds = %format!("{:.2}", clip.duration_seconds()),
        "Audio decoding complete"
    );

    Ok(clip)
}
