//! Per-stage run statistics
//!
//! **Purpose:** Aggregate counts across the five stages for the final log
//! line and for hosts that report progress.

use serde::Serialize;

use crate::services::candidate_selector::TierCounts;

/// **SELECTING Stage Statistics**
///
/// Display: "N of M results selected"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectingStats {
    /// Results requested from the search backend
    pub requested: usize,
    /// Results returned
    pub results: usize,
    /// Candidates selected
    pub selected: usize,
    /// Items admitted per relaxation tier
    pub tiers: TierCounts,
    /// Search failed outright (no metadata obtainable)
    pub search_failed: bool,
}

impl SelectingStats {
    pub fn display_string(&self) -> String {
        if self.search_failed {
            "search failed".to_string()
        } else {
            format!("{} of {} results selected", self.selected, self.results)
        }
    }
}

/// **ACQUIRING Stage Statistics**
///
/// Display: "N raw files (X fetched, Y present, Z failed)"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AcquiringStats {
    pub fetched: usize,
    pub already_present: usize,
    pub failed: usize,
    /// Raw files on disk after the stage
    pub raw_files: usize,
    /// Query fallback was used
    pub used_fallback: bool,
}

impl AcquiringStats {
    pub fn display_string(&self) -> String {
        let mut text = format!(
            "{} raw files ({} fetched, {} present, {} failed)",
            self.raw_files, self.fetched, self.already_present, self.failed
        );
        if self.used_fallback {
            text.push_str(" via query fallback");
        }
        text
    }
}

/// **NORMALIZING / TRIMMING Stage Statistics**
///
/// Display: "N ready (X new, Y skipped, Z failed)"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub processed: usize,
    pub already_present: usize,
    pub failed: usize,
}

impl ConversionStats {
    pub fn ready(&self) -> usize {
        self.processed + self.already_present
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} ready ({} new, {} skipped, {} failed)",
            self.ready(),
            self.processed,
            self.already_present,
            self.failed
        )
    }
}

/// **MERGING Stage Statistics**
///
/// Display: "N segments merged, M skipped, D s"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergingStats {
    pub merged: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

impl MergingStats {
    pub fn display_string(&self) -> String {
        format!(
            "{} segments merged, {} skipped, {:.1} s",
            self.merged,
            self.skipped,
            self.duration_ms as f64 / 1000.0
        )
    }
}

/// Statistics of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStatistics {
    pub selecting: SelectingStats,
    pub acquiring: AcquiringStats,
    pub normalizing: ConversionStats,
    pub trimming: ConversionStats,
    pub merging: MergingStats,
}

impl PipelineStatistics {
    /// One line per stage, in pipeline order
    pub fn summary_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Selecting", self.selecting.display_string()),
            ("Acquiring", self.acquiring.display_string()),
            ("Normalizing", self.normalizing.display_string()),
            ("Trimming", self.trimming.display_string()),
            ("Merging", self.merging.display_string()),
        ]
    }
}
