//! Search results and selected candidates

use serde::{Deserialize, Serialize};

/// One entry returned by the search backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Stable identifier, reused as the asset file stem
    pub id: String,
    pub title: String,
    /// Duration in seconds, when the backend knows it
    pub duration_secs: Option<f64>,
    /// Stable page URL (preferred for download)
    pub webpage_url: Option<String>,
    /// Raw URL (fallback for download)
    pub url: Option<String>,
}

impl SearchResult {
    /// URL handed to the download backend
    ///
    /// The page URL wins; the raw URL is only used when no page URL exists.
    /// Blank strings count as missing.
    pub fn playable_url(&self) -> Option<&str> {
        self.webpage_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.url.as_deref().filter(|u| !u.trim().is_empty()))
    }

    /// True when the duration is unknown or within `max_secs`
    pub fn fits_duration(&self, max_secs: f64) -> bool {
        match self.duration_secs {
            None => true,
            Some(secs) => secs <= max_secs,
        }
    }
}

/// Which relaxation tier admitted a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionTier {
    /// Unknown duration or within the preferred maximum
    Preferred,
    /// Unknown duration or within the relaxed maximum
    Relaxed,
    /// Any duration
    Unfiltered,
}

/// A search result chosen for download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub result: SearchResult,
    pub tier: SelectionTier,
}

impl Candidate {
    pub fn id(&self) -> &str {
        &self.result.id
    }
}
