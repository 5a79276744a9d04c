//! Normalization stage
//!
//! Converts every raw file into the canonical audio format
//! (`<normalized>/<id>.mp3`). Audio containers are transcoded directly;
//! anything else is treated as a video container and its audio track is
//! extracted.
//!
//! Presence of the normalized file is enough to skip an asset, so the stage
//! is idempotent across restarts.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::error::CodecError;
use crate::models::WorkDirs;
use crate::types::{AudioBackend, VideoBackend};
use crate::utils::stage_dir::{
    asset_id, commit_partial, discard_partial, list_stage_files, partial_path,
};

/// Extensions handled by the audio backend without video demuxing
pub const AUDIO_CONTAINER_EXTENSIONS: &[&str] =
    &["m4a", "mp3", "webm", "aac", "wav", "ogg", "flac"];

/// True when `path` has a known audio container extension (case-insensitive)
pub fn is_audio_container(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            AUDIO_CONTAINER_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Outcome of one pass over a stage directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Assets skipped because their output already existed
    pub already_present: usize,
    /// Assets produced by this pass
    pub processed: usize,
    /// Assets that failed and were skipped
    pub failed: usize,
}

impl StageReport {
    /// Assets materialized in the stage's output directory
    pub fn total(&self) -> usize {
        self.already_present + self.processed
    }
}

/// Raw → canonical audio converter
pub struct Normalizer<'a> {
    audio: &'a dyn AudioBackend,
    video: &'a dyn VideoBackend,
    pause: Duration,
}

impl<'a> Normalizer<'a> {
    pub fn new(audio: &'a dyn AudioBackend, video: &'a dyn VideoBackend, pause: Duration) -> Self {
        Self { audio, video, pause }
    }

    /// Normalize every raw file not yet present in the normalized directory
    ///
    /// # Errors
    /// Only systemic failures (codec not installed, directory I/O) are
    /// returned; a corrupt raw file is logged and counted as failed.
    pub fn normalize_all(&self, dirs: &WorkDirs) -> Result<StageReport, CodecError> {
        std::fs::create_dir_all(&dirs.normalized)?;

        let raw_files = list_stage_files(&dirs.raw, None)?;
        let mut report = StageReport::default();
        let mut seen: HashSet<String> = HashSet::new();

        tracing::info!(raw_files = raw_files.len(), "Normalizing raw files");

        for raw in &raw_files {
            let id = match asset_id(raw) {
                Some(id) => id,
                None => continue,
            };

            // Two raw files for one id (e.g. a.webm and a.mp4): first one wins
            if !seen.insert(id.clone()) {
                tracing::debug!(
                    asset = %id,
                    file = %raw.display(),
                    "Duplicate raw file for asset, ignoring"
                );
                continue;
            }

            let target = dirs.normalized_path(&id);
            if target.exists() {
                tracing::debug!(asset = %id, "Already normalized, skipping");
                report.already_present += 1;
                continue;
            }

            match self.normalize_one(raw, &target) {
                Ok(()) => {
                    tracing::info!(asset = %id, output = %target.display(), "Normalized");
                    report.processed += 1;
                    if !self.pause.is_zero() {
                        std::thread::sleep(self.pause);
                    }
                }
                Err(e) if e.is_item_failure() => {
                    tracing::warn!(
                        asset = %id,
                        file = %raw.display(),
                        error = %e,
                        "Normalization failed, skipping"
                    );
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Convert one raw file, writing through a partial file
    pub fn normalize_one(&self, raw: &Path, target: &Path) -> Result<(), CodecError> {
        let partial = partial_path(target);

        let result = if is_audio_container(raw) {
            tracing::debug!(
                file = %raw.display(),
                backend = self.audio.name(),
                "Transcoding audio container"
            );
            self.audio.transcode(raw, &partial)
        } else {
            tracing::debug!(
                file = %raw.display(),
                backend = self.video.name(),
                "Extracting audio from video container"
            );
            self.extract_video_audio(raw, &partial)
        };

        match result.and_then(|()| commit_partial(target).map_err(CodecError::from)) {
            Ok(()) => Ok(()),
            Err(e) => {
                discard_partial(target);
                Err(e)
            }
        }
    }

    fn extract_video_audio(&self, raw: &Path, dst: &Path) -> Result<(), CodecError> {
        let mut handle = self.video.open(raw)?;
        let result = handle.export_audio(dst);
        drop(handle);
        result
    }
}
