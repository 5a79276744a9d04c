//! Stage 3: NORMALIZING

use super::WorkflowOrchestrator;
use super::statistics::PipelineStatistics;
use crate::error::PipelineResult;
use crate::models::{PipelineRun, RunState};
use crate::services::normalizer::Normalizer;

impl WorkflowOrchestrator {
    /// Stage 3: NORMALIZING - raw files to canonical audio
    ///
    /// # Returns
    /// Number of normalized assets (existing + newly converted)
    pub(super) fn phase_normalizing(
        &self,
        run: &mut PipelineRun,
        statistics: &mut PipelineStatistics,
    ) -> PipelineResult<usize> {
        run.transition_to(RunState::Normalizing);
        tracing::info!(run_id = %run.run_id, "Stage 3: NORMALIZING");

        let normalizer = Normalizer::new(
            self.audio.as_ref(),
            self.video.as_ref(),
            self.conversion_pause(),
        );
        let report = normalizer.normalize_all(&self.dirs)?;

        statistics.normalizing.processed = report.processed;
        statistics.normalizing.already_present = report.already_present;
        statistics.normalizing.failed = report.failed;

        tracing::info!(
            run_id = %run.run_id,
            summary = %statistics.normalizing.display_string(),
            "Normalization finished"
        );

        Ok(report.total())
    }
}
