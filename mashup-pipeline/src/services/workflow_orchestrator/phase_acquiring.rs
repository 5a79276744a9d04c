//! Stage 2: ACQUIRING
//!
//! Downloads the selected candidates, or fetches directly by query when the
//! selection is empty.

use super::WorkflowOrchestrator;
use super::statistics::PipelineStatistics;
use crate::error::PipelineResult;
use crate::models::{PipelineRun, RunState};
use crate::services::acquisition::AcquisitionStage;
use crate::services::candidate_selector::Selection;

impl WorkflowOrchestrator {
    /// Stage 2: ACQUIRING - fill the raw directory
    ///
    /// # Returns
    /// Number of raw files on disk afterwards
    pub(super) fn phase_acquiring(
        &self,
        run: &mut PipelineRun,
        statistics: &mut PipelineStatistics,
        selection: &Selection,
    ) -> PipelineResult<usize> {
        run.transition_to(RunState::Acquiring);

        tracing::info!(
            run_id = %run.run_id,
            candidates = selection.len(),
            raw_dir = %self.dirs.raw.display(),
            "Stage 2: ACQUIRING"
        );

        let stage = AcquisitionStage::new(self.downloader.as_ref());
        let report = if selection.is_empty() {
            stage.acquire_by_query(&run.params.performer, run.params.clip_count, &self.dirs.raw)?
        } else {
            stage.acquire(&selection.candidates, &self.dirs.raw)?
        };

        statistics.acquiring.fetched = report.fetched;
        statistics.acquiring.already_present = report.already_present;
        statistics.acquiring.failed = report.failed;
        statistics.acquiring.raw_files = report.raw_count();
        statistics.acquiring.used_fallback = report.used_fallback;

        tracing::info!(
            run_id = %run.run_id,
            summary = %statistics.acquiring.display_string(),
            "Acquisition finished"
        );

        Ok(report.raw_count())
    }
}
