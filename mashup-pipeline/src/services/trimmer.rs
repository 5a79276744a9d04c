//! Trim stage
//!
//! Caps every normalized asset to the run's clip duration, measured from the
//! start. Clips already shorter than the target are copied unchanged; they
//! are never padded.

use std::path::Path;

use crate::error::CodecError;
use crate::models::{WorkDirs, CANONICAL_EXTENSION};
use crate::services::normalizer::StageReport;
use crate::types::AudioBackend;
use crate::utils::stage_dir::{
    asset_id, commit_partial, discard_partial, list_stage_files, partial_path,
};

/// Normalized → trimmed converter
pub struct Trimmer<'a> {
    audio: &'a dyn AudioBackend,
    target_ms: u64,
}

impl<'a> Trimmer<'a> {
    pub fn new(audio: &'a dyn AudioBackend, clip_seconds: u64) -> Self {
        Self {
            audio,
            target_ms: clip_seconds.saturating_mul(1000),
        }
    }

    pub fn target_ms(&self) -> u64 {
        self.target_ms
    }

    /// Trim every normalized asset not yet present in the trimmed directory
    pub fn trim_all(&self, dirs: &WorkDirs) -> Result<StageReport, CodecError> {
        std::fs::create_dir_all(&dirs.trimmed)?;

        let normalized = list_stage_files(&dirs.normalized, Some(CANONICAL_EXTENSION))?;
        let mut report = StageReport::default();

        tracing::info!(
            normalized_files = normalized.len(),
            target_ms = self.target_ms,
            "Trimming normalized files"
        );

        for source in &normalized {
            let id = match asset_id(source) {
                Some(id) => id,
                None => continue,
            };

            let target = dirs.trimmed_path(&id);
            if target.exists() {
                tracing::debug!(asset = %id, "Already trimmed, skipping");
                report.already_present += 1;
                continue;
            }

            match self.trim_one(source, &target) {
                Ok(()) => {
                    report.processed += 1;
                }
                Err(e) if e.is_item_failure() => {
                    tracing::warn!(
                        asset = %id,
                        file = %source.display(),
                        error = %e,
                        "Trim failed, skipping"
                    );
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Trim one file to `[0, min(target, duration))`
    pub fn trim_one(&self, source: &Path, target: &Path) -> Result<(), CodecError> {
        let partial = partial_path(target);

        let result = self.write_trimmed(source, &partial);
        match result.and_then(|()| commit_partial(target).map_err(CodecError::from)) {
            Ok(()) => Ok(()),
            Err(e) => {
                discard_partial(target);
                Err(e)
            }
        }
    }

    fn write_trimmed(&self, source: &Path, partial: &Path) -> Result<(), CodecError> {
        // Only the head is decoded; the rest of the file never reaches memory
        let head = self.audio.load_head(source, self.target_ms)?;

        if !head.is_longer_than_ms(self.target_ms) {
            tracing::debug!(
                file = %source.display(),
                duration_ms = head.duration_ms(),
                target_ms = self.target_ms,
                "Clip shorter than target, copying unchanged"
            );
            std::fs::copy(source, partial)?;
            return Ok(());
        }

        tracing::debug!(file = %source.display(), target_ms = self.target_ms, "Trimming");
        self.audio.export(&head.slice_ms(0, self.target_ms), partial)
    }
}
