//! Acquisition stage
//!
//! Resolves each selected candidate to a file in the raw directory. One
//! failed download never aborts the batch; only systemic backend errors
//! (downloader not installed, raw directory unwritable) do.
//!
//! The result is always read back from the raw directory instead of trusting
//! what the backend reported.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::BackendError;
use crate::models::Candidate;
use crate::types::DownloadBackend;
use crate::utils::stage_dir::{asset_id, list_stage_files};

/// Per-run acquisition tally
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquisitionReport {
    /// Candidates whose raw file already existed
    pub already_present: usize,
    /// Candidates downloaded by this run
    pub fetched: usize,
    /// Candidates that could not be downloaded
    pub failed: usize,
    /// True when the query fallback was used instead of per-item fetches
    pub used_fallback: bool,
    /// Raw files on disk after the attempt, sorted by file name
    pub raw_files: Vec<PathBuf>,
}

impl AcquisitionReport {
    pub fn raw_count(&self) -> usize {
        self.raw_files.len()
    }
}

/// Download driver over a [`DownloadBackend`]
pub struct AcquisitionStage<'a> {
    downloader: &'a dyn DownloadBackend,
}

impl<'a> AcquisitionStage<'a> {
    pub fn new(downloader: &'a dyn DownloadBackend) -> Self {
        Self { downloader }
    }

    /// Fetch every candidate not already present in `raw_dir`
    pub fn acquire(
        &self,
        candidates: &[Candidate],
        raw_dir: &Path,
    ) -> Result<AcquisitionReport, BackendError> {
        std::fs::create_dir_all(raw_dir)?;

        let mut report = AcquisitionReport::default();
        let mut present = present_ids(raw_dir)?;

        for (index, candidate) in candidates.iter().enumerate() {
            let id = candidate.id();

            if present.contains(id) {
                tracing::debug!(asset = %id, "Raw file already present, skipping download");
                report.already_present += 1;
                continue;
            }

            let url = match candidate.result.playable_url() {
                Some(url) => url,
                None => {
                    tracing::warn!(asset = %id, "Candidate has no URL, skipping");
                    report.failed += 1;
                    continue;
                }
            };

            tracing::info!(
                asset = %id,
                title = %candidate.result.title,
                progress = %format!("{}/{}", index + 1, candidates.len()),
                "Downloading"
            );

            match self.downloader.fetch(url, raw_dir) {
                Ok(()) => {
                    present = present_ids(raw_dir)?;
                    if present.contains(id) {
                        report.fetched += 1;
                    } else {
                        tracing::warn!(
                            asset = %id,
                            backend = self.downloader.name(),
                            "Download reported success but no raw file was written"
                        );
                        report.failed += 1;
                    }
                }
                Err(e) if e.is_item_failure() => {
                    tracing::warn!(asset = %id, error = %e, "Download failed, skipping");
                    report.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        report.raw_files = list_stage_files(raw_dir, None)?;
        Ok(report)
    }

    /// Let the backend resolve and fetch `count` items for `query` itself
    ///
    /// Used when search produced no metadata. Bypasses duration filtering.
    pub fn acquire_by_query(
        &self,
        query: &str,
        count: usize,
        raw_dir: &Path,
    ) -> Result<AcquisitionReport, BackendError> {
        std::fs::create_dir_all(raw_dir)?;

        let before = present_ids(raw_dir)?;
        tracing::info!(
            query,
            count,
            backend = self.downloader.name(),
            "Fetching directly by query"
        );

        match self.downloader.fetch_by_query(query, count, raw_dir) {
            Ok(()) => {}
            Err(e) if e.is_item_failure() => {
                tracing::warn!(
                    query,
                    error = %e,
                    "Query download reported errors, keeping what arrived"
                );
            }
            Err(e) => return Err(e),
        }

        let raw_files = list_stage_files(raw_dir, None)?;
        let fetched = raw_files
            .iter()
            .filter_map(|path| asset_id(path))
            .filter(|id| !before.contains(id))
            .count();

        Ok(AcquisitionReport {
            already_present: before.len(),
            fetched,
            failed: 0,
            used_fallback: true,
            raw_files,
        })
    }
}

fn present_ids(raw_dir: &Path) -> std::io::Result<HashSet<String>> {
    Ok(list_stage_files(raw_dir, None)?
        .iter()
        .filter_map(|path| asset_id(path))
        .collect())
}
