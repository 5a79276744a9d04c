//! Candidate selection
//!
//! Picks at most N search results, preferring shorter items, by relaxing
//! the duration filter in three tiers:
//! 1. unknown duration or `<= preferred_max`
//! 2. unknown duration or `<= relaxed_max`
//! 3. any duration
//!
//! Each tier scans the input result list in order and only adds items
//! not already selected. Membership is decided by identifier, so two
//! results with the same id are the same item and only the first one can
//! be picked.

use std::collections::HashSet;

use mashup_common::config::PipelineSettings;
use serde::Serialize;

use crate::models::{Candidate, SearchResult, SelectionTier};

/// Outcome of one selection pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Chosen candidates in discovery order within each tier
    pub candidates: Vec<Candidate>,
    /// Items admitted per tier
    pub counts: TierCounts,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Items admitted by each tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub preferred: usize,
    pub relaxed: usize,
    pub unfiltered: usize,
}

/// Three-tier duration relaxation selector
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSelector {
    preferred_max_secs: f64,
    relaxed_max_secs: f64,
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

impl CandidateSelector {
    pub fn new(preferred_max_secs: f64, relaxed_max_secs: f64) -> Self {
        Self {
            preferred_max_secs,
            relaxed_max_secs,
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(
            settings.preferred_max_duration_secs,
            settings.relaxed_max_duration_secs,
        )
    }

    pub fn preferred_max_secs(&self) -> f64 {
        self.preferred_max_secs
    }

    pub fn relaxed_max_secs(&self) -> f64 {
        self.relaxed_max_secs
    }

    /// Select at most `target` candidates from `results`
    ///
    /// Output is empty only when `results` is empty or `target` is zero.
    pub fn select(&self, results: &[SearchResult], target: usize) -> Selection {
        let mut selection = Selection::default();
        let mut chosen: HashSet<&str> = HashSet::new();

        let tiers = [
            (SelectionTier::Preferred, Some(self.preferred_max_secs)),
            (SelectionTier::Relaxed, Some(self.relaxed_max_secs)),
            (SelectionTier::Unfiltered, None),
        ];

        for (tier, max_secs) in tiers {
            if selection.len() >= target {
                break;
            }

            if tier != SelectionTier::Preferred {
                match max_secs {
                    Some(max) => tracing::info!(
                        selected = selection.len(),
                        target,
                        max_duration_secs = max,
                        "Relaxing max duration"
                    ),
                    None => tracing::info!(
                        selected = selection.len(),
                        target,
                        "Relaxing duration filter entirely"
                    ),
                }
            }

            let admitted = self.admit(results, target, tier, max_secs, &mut chosen, &mut selection);
            match tier {
                SelectionTier::Preferred => selection.counts.preferred = admitted,
                SelectionTier::Relaxed => selection.counts.relaxed = admitted,
                SelectionTier::Unfiltered => selection.counts.unfiltered = admitted,
            }
        }

        selection
    }

    fn admit<'r>(
        &self,
        results: &'r [SearchResult],
        target: usize,
        tier: SelectionTier,
        max_secs: Option<f64>,
        chosen: &mut HashSet<&'r str>,
        selection: &mut Selection,
    ) -> usize {
        let mut admitted = 0;
        for result in results {
            if selection.len() >= target {
                break;
            }
            if chosen.contains(result.id.as_str()) {
                continue;
            }
            if let Some(max) = max_secs {
                if !result.fits_duration(max) {
                    continue;
                }
            }

            chosen.insert(result.id.as_str());
            selection.candidates.push(Candidate {
                result: result.clone(),
                tier,
            });
            admitted += 1;
        }
        admitted
    }
}
