//! Stage 1: SELECTING
//!
//! Searches for the performer and picks candidates with the three-tier
//! duration policy. Never fails the run: a failed or empty search leaves an
//! empty selection, which sends Acquiring down the query fallback.

use super::WorkflowOrchestrator;
use super::statistics::PipelineStatistics;
use crate::models::{PipelineRun, RunState};
use crate::services::candidate_selector::{CandidateSelector, Selection};

impl WorkflowOrchestrator {
    /// Stage 1: SELECTING - search and candidate selection
    pub(super) fn phase_selecting(
        &self,
        run: &mut PipelineRun,
        statistics: &mut PipelineStatistics,
    ) -> Selection {
        run.transition_to(RunState::Selecting);

        let target = run.params.clip_count;
        let requested = self.settings.search_count(target);
        statistics.selecting.requested = requested;

        tracing::info!(
            run_id = %run.run_id,
            query = %run.params.performer,
            requested,
            backend = self.search.name(),
            "Stage 1: SELECTING"
        );

        let results = match self.search.search(&run.params.performer, requested) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(
                    run_id = %run.run_id,
                    error = %e,
                    "Search failed, acquisition will fetch by query"
                );
                statistics.selecting.search_failed = true;
                return Selection::default();
            }
        };

        let selector = CandidateSelector::from_settings(&self.settings);
        let selection = selector.select(&results, target);

        statistics.selecting.results = results.len();
        statistics.selecting.selected = selection.len();
        statistics.selecting.tiers = selection.counts;

        if selection.is_empty() {
            tracing::warn!(
                run_id = %run.run_id,
                results = results.len(),
                "No candidates selected, acquisition will fetch by query"
            );
        } else {
            tracing::info!(
                run_id = %run.run_id,
                results = results.len(),
                selected = selection.len(),
                preferred = selection.counts.preferred,
                relaxed = selection.counts.relaxed,
                unfiltered = selection.counts.unfiltered,
                "Candidates selected"
            );
        }

        selection
    }
}
