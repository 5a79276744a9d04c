//! Run parameter validation
//!
//! Both invocation surfaces (CLI arguments and the web form) accept the
//! clip count and clip duration as text and validate them here, so the
//! thresholds live in exactly one place.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Clip count must be strictly greater than this
pub const MIN_CLIP_COUNT_EXCLUSIVE: usize = 10;

/// Clip duration (seconds) must be strictly greater than this
pub const MIN_CLIP_SECONDS_EXCLUSIVE: u64 = 20;

/// Canonical extension of the merged output
pub const OUTPUT_EXTENSION: &str = ".mp3";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

/// Why a set of run parameters was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Singer name must not be empty.")]
    EmptyPerformer,

    #[error("NumberOfVideos and AudioDuration must be integers.")]
    NotInteger,

    #[error("Error: NumberOfVideos must be greater than 10.")]
    TooFewClips,

    #[error("Error: AudioDuration must be greater than 20 seconds.")]
    ClipTooShort,

    #[error("Output file name must be a plain file name.")]
    InvalidOutputName,
}

impl From<ParamError> for crate::Error {
    fn from(err: ParamError) -> Self {
        crate::Error::InvalidInput(err.to_string())
    }
}

/// Validated parameters of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParameters {
    /// Performer name, used verbatim as the search query
    pub performer: String,
    /// Number of clips to gather
    pub clip_count: usize,
    /// Per-clip trim duration in seconds
    pub clip_seconds: u64,
    /// Output file name, always ending in `.mp3`
    pub output_name: String,
}

impl RunParameters {
    /// Validate raw textual parameters
    ///
    /// Integers are checked before thresholds, matching the order in which
    /// the errors are reported to users.
    pub fn parse(
        performer: &str,
        clip_count: &str,
        clip_seconds: &str,
        output_name: &str,
    ) -> Result<Self, ParamError> {
        let performer = performer.trim();
        if performer.is_empty() {
            return Err(ParamError::EmptyPerformer);
        }

        let clip_count: i64 = clip_count.trim().parse().map_err(|_| ParamError::NotInteger)?;
        let clip_seconds: i64 = clip_seconds.trim().parse().map_err(|_| ParamError::NotInteger)?;

        let output_name = normalize_output_name(output_name)?;

        if clip_count <= MIN_CLIP_COUNT_EXCLUSIVE as i64 {
            return Err(ParamError::TooFewClips);
        }
        if clip_seconds <= MIN_CLIP_SECONDS_EXCLUSIVE as i64 {
            return Err(ParamError::ClipTooShort);
        }

        Ok(Self {
            performer: performer.to_string(),
            clip_count: clip_count as usize,
            clip_seconds: clip_seconds as u64,
            output_name,
        })
    }
}

/// Enforce the `.mp3` suffix and reject anything that is not a bare file name
pub fn normalize_output_name(raw: &str) -> Result<String, ParamError> {
    let name = raw.trim();
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ParamError::InvalidOutputName);
    }

    if name.to_lowercase().ends_with(OUTPUT_EXTENSION) {
        Ok(name.to_string())
    } else {
        Ok(format!("{}{}", name, OUTPUT_EXTENSION))
    }
}

/// Check an email address against the form's accepted pattern
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}
