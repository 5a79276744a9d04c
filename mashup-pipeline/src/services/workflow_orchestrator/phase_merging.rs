//! Stage 5: MERGING

use std::path::PathBuf;

use super::WorkflowOrchestrator;
use super::statistics::PipelineStatistics;
use crate::error::PipelineResult;
use crate::models::{PipelineRun, RunState};
use crate::services::merger::Merger;

impl WorkflowOrchestrator {
    /// Stage 5: MERGING - concatenate trimmed clips into the output file
    ///
    /// # Returns
    /// The written output, or `None` when no segment was usable
    pub(super) fn phase_merging(
        &self,
        run: &mut PipelineRun,
        statistics: &mut PipelineStatistics,
    ) -> PipelineResult<Option<PathBuf>> {
        run.transition_to(RunState::Merging);

        let output_path = self.output_path(run);
        tracing::info!(run_id = %run.run_id, output = %output_path.display(), "Stage 5: MERGING");

        let report = Merger::new(self.audio.as_ref()).merge(&self.dirs, &output_path)?;

        statistics.merging.merged = report.merged.len();
        statistics.merging.skipped = report.skipped.len();
        statistics.merging.duration_ms = report.duration_ms;

        tracing::info!(
            run_id = %run.run_id,
            summary = %statistics.merging.display_string(),
            "Merge finished"
        );

        Ok(report.output_path)
    }
}
