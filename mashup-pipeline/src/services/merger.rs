//! Merge stage
//!
//! Concatenates every trimmed asset, ordered by identifier, into one output
//! file. Segments that fail to decode, or whose format differs from the
//! first usable segment, are skipped. The output is written only when at
//! least one segment was usable.

use std::path::{Path, PathBuf};

use crate::error::CodecError;
use crate::models::{AudioClip, WorkDirs, CANONICAL_EXTENSION};
use crate::types::AudioBackend;
use crate::utils::stage_dir::{
    asset_id, commit_partial, discard_partial, list_stage_files, partial_path,
};

/// Outcome of a merge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Written output, `None` when nothing was usable
    pub output_path: Option<PathBuf>,
    /// Identifiers concatenated, in merge order
    pub merged: Vec<String>,
    /// Identifiers skipped because they could not be used
    pub skipped: Vec<String>,
    /// Duration of the written output
    pub duration_ms: u64,
}

impl MergeReport {
    pub fn is_written(&self) -> bool {
        self.output_path.is_some()
    }
}

/// Trimmed files → one output file
pub struct Merger<'a> {
    audio: &'a dyn AudioBackend,
}

impl<'a> Merger<'a> {
    pub fn new(audio: &'a dyn AudioBackend) -> Self {
        Self { audio }
    }

    /// Trimmed files in merge order (ascending identifier)
    ///
    /// Sorted explicitly so the order never depends on directory
    /// enumeration.
    pub fn merge_order(trimmed_dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
        let mut segments: Vec<(String, PathBuf)> =
            list_stage_files(trimmed_dir, Some(CANONICAL_EXTENSION))?
                .into_iter()
                .filter_map(|path| asset_id(&path).map(|id| (id, path)))
                .collect();
        segments.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(segments)
    }

    /// Merge every trimmed asset into `output_path`
    ///
    /// An existing file at `output_path` is replaced in one rename.
    pub fn merge(&self, dirs: &WorkDirs, output_path: &Path) -> Result<MergeReport, CodecError> {
        let segments = Self::merge_order(&dirs.trimmed)?;
        let mut report = MergeReport::default();
        let mut mix: Option<AudioClip> = None;

        tracing::info!(
            segments = segments.len(),
            output = %output_path.display(),
            "Merging trimmed files"
        );

        for (id, path) in &segments {
            let clip = match self.audio.load(path) {
                Ok(clip) => clip,
                Err(e) if e.is_item_failure() => {
                    tracing::warn!(asset = %id, error = %e, "Segment unreadable, skipping");
                    report.skipped.push(id.clone());
                    continue;
                }
                Err(e) => return Err(e),
            };

            match mix.as_mut() {
                None => mix = Some(clip),
                Some(mix) => {
                    if let Err(e) = mix.append(&clip) {
                        tracing::warn!(asset = %id, error = %e, "Segment format differs, skipping");
                        report.skipped.push(id.clone());
                        continue;
                    }
                }
            }
            report.merged.push(id.clone());
        }

        let mix = match mix {
            Some(mix) => mix,
            None => {
                tracing::warn!("No usable trimmed segments, output not written");
                return Ok(report);
            }
        };

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let partial = partial_path(output_path);
        let written = self
            .audio
            .export(&mix, &partial)
            .and_then(|()| commit_partial(output_path).map_err(CodecError::from));
        if let Err(e) = written {
            discard_partial(output_path);
            return Err(e);
        }

        report.duration_ms = mix.duration_ms();
        report.output_path = Some(output_path.to_path_buf());

        tracing::info!(
            output = %output_path.display(),
            merged = report.merged.len(),
            skipped = report.skipped.len(),
            duration_seconds = %format!("{:.1}", mix.duration_seconds()),
            "Merge complete"
        );

        Ok(report)
    }
}
