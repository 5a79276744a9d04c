//! Decoded PCM audio
//!
//! Samples are interleaved f32 in [-1.0, 1.0]. Slicing works on whole frames
//! so channels never get shifted against each other.

use crate::error::CodecError;

/// Decoded audio buffer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClip {
    /// Wrap interleaved samples
    ///
    /// A trailing partial frame is dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// True when the clip holds at least one frame past `ms`
    pub fn is_longer_than_ms(&self, ms: u64) -> bool {
        self.frames() as u64 > ms.saturating_mul(self.sample_rate as u64) / 1000
    }

    fn frame_at_ms(&self, ms: u64) -> usize {
        let frame = ms.saturating_mul(self.sample_rate as u64) / 1000;
        (frame as usize).min(self.frames())
    }

    /// Copy of the `[start_ms, end_ms)` window, clamped to the clip
    ///
    /// Never pads: a window past the end yields whatever audio exists.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioClip {
        let start = self.frame_at_ms(start_ms);
        let end = self.frame_at_ms(end_ms).max(start);
        let ch = self.channels as usize;
        AudioClip {
            samples: self.samples[start * ch..end * ch].to_vec(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    pub fn same_format(&self, other: &AudioClip) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }

    /// Append `other` directly after the last frame (no gap, no cross-fade)
    pub fn append(&mut self, other: &AudioClip) -> Result<(), CodecError> {
        if !self.same_format(other) {
            return Err(CodecError::FormatMismatch {
                expected_rate: self.sample_rate,
                expected_channels: self.channels,
                found_rate: other.sample_rate,
                found_channels: other.channels,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Consuming form of [`AudioClip::append`]
    pub fn concat(mut self, other: &AudioClip) -> Result<AudioClip, CodecError> {
        self.append(other)?;
        Ok(self)
    }
}
