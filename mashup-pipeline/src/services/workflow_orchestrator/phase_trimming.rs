//! Stage 4: TRIMMING

use super::WorkflowOrchestrator;
use super::statistics::PipelineStatistics;
use crate::error::PipelineResult;
use crate::models::{PipelineRun, RunState};
use crate::services::trimmer::Trimmer;

impl WorkflowOrchestrator {
    /// Stage 4: TRIMMING - cap every normalized clip to the run's duration
    ///
    /// # Returns
    /// Number of trimmed assets (existing + newly trimmed)
    pub(super) fn phase_trimming(
        &self,
        run: &mut PipelineRun,
        statistics: &mut PipelineStatistics,
    ) -> PipelineResult<usize> {
        run.transition_to(RunState::Trimming);
        tracing::info!(
            run_id = %run.run_id,
            clip_seconds = run.params.clip_seconds,
            "Stage 4: TRIMMING"
        );

        let trimmer = Trimmer::new(self.audio.as_ref(), run.params.clip_seconds);
        let report = trimmer.trim_all(&self.dirs)?;

        statistics.trimming.processed = report.processed;
        statistics.trimming.already_present = report.already_present;
        statistics.trimming.failed = report.failed;

        tracing::info!(
            run_id = %run.run_id,
            summary = %statistics.trimming.display_string(),
            "Trimming finished"
        );

        Ok(report.total())
    }
}
