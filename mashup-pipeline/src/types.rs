//! Backend Trait Definitions for mashup-pipeline
//!
//! The pipeline talks to four external collaborators, each behind a narrow
//! synchronous trait:
//! - **SearchBackend:** query → search results
//! - **DownloadBackend:** URL (or query) → files in the raw directory
//! - **AudioBackend:** decode, encode and transcode canonical audio
//! - **VideoBackend:** extract the audio track of a video container
//!
//! Concrete implementations live in `services::ytdlp_client` and
//! `services::ffmpeg_codec`; tests substitute in-memory backends.

use std::path::Path;

use crate::error::{BackendError, CodecError};
use crate::models::{AudioClip, SearchResult};

// ============================================================================
// Search / Download
// ============================================================================

/// Web video search
pub trait SearchBackend: Send + Sync {
    /// Backend name for log lines
    fn name(&self) -> &'static str;

    /// Search for up to `desired_count` results, in backend ranking order
    ///
    /// # Errors
    /// Any error means no metadata was obtainable; the caller falls back to
    /// [`DownloadBackend::fetch_by_query`].
    fn search(&self, query: &str, desired_count: usize) -> Result<Vec<SearchResult>, BackendError>;
}

/// Media download into the raw stage directory
pub trait DownloadBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch one URL to `<raw_dir>/<id>.<ext>`
    ///
    /// The extension is chosen by the backend from the content type.
    fn fetch(&self, url: &str, raw_dir: &Path) -> Result<(), BackendError>;

    /// Resolve and fetch up to `count` items for `query` directly
    ///
    /// Individual item failures must not fail the call; only errors that
    /// prevent the whole batch (tool missing, I/O) are returned.
    fn fetch_by_query(&self, query: &str, count: usize, raw_dir: &Path) -> Result<(), BackendError>;
}

// ============================================================================
// Codecs
// ============================================================================

/// Canonical audio decode / encode
///
/// Canonical format: MP3, 44.1 kHz, stereo.
pub trait AudioBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decode a file into PCM
    fn load(&self, path: &Path) -> Result<AudioClip, CodecError>;

    /// Decode the start of a file, up to one frame past `max_ms`
    ///
    /// Files no longer than `max_ms` come back whole. The default decodes the
    /// whole file, which satisfies the same contract.
    fn load_head(&self, path: &Path, max_ms: u64) -> Result<AudioClip, CodecError> {
        let _ = max_ms;
        self.load(path)
    }

    /// Encode PCM to `path` in the canonical format
    fn export(&self, clip: &AudioClip, path: &Path) -> Result<(), CodecError>;

    /// Re-encode an audio container straight to the canonical format
    fn transcode(&self, src: &Path, dst: &Path) -> Result<(), CodecError>;
}

/// Opened video container
///
/// Decode resources are released when the handle is dropped.
pub trait VideoHandle {
    /// Write the audio track to `dst` in the canonical format
    fn export_audio(&mut self, dst: &Path) -> Result<(), CodecError>;
}

/// Video container access
pub trait VideoBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open a video file for audio extraction
    ///
    /// # Errors
    /// `Decode` when the file has no audio track or cannot be read.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn VideoHandle + 'a>, CodecError>;
}
