//! Error types for mashup-web
//!
//! Every variant renders as a short line on the form page. Details go to
//! the log only.

use mashup_common::run_params::ParamError;
use mashup_pipeline::services::NotifyError;
use thiserror::Error;

/// Form handling errors
#[derive(Debug, Error)]
pub enum WebError {
    /// A field was blank or missing
    #[error("All fields are required!")]
    MissingField,

    #[error("Please enter a valid email address!")]
    InvalidEmail,

    #[error("Number of videos and duration must be integers!")]
    NotInteger,

    #[error("Number of videos must be greater than 10!")]
    TooFewClips,

    #[error("Duration must be greater than 20 seconds!")]
    ClipTooShort,

    /// Parameters rejected for another reason
    #[error("Invalid request: {0}")]
    InvalidParams(ParamError),

    /// Delivery of a finished mashup failed
    #[error("Delivery failed: {0}")]
    Delivery(#[from] NotifyError),

    /// The pipeline task panicked or was cancelled
    #[error("Pipeline task aborted: {0}")]
    TaskAborted(String),
}

impl From<ParamError> for WebError {
    fn from(err: ParamError) -> Self {
        match err {
            ParamError::EmptyPerformer => WebError::MissingField,
            ParamError::NotInteger => WebError::NotInteger,
            ParamError::TooFewClips => WebError::TooFewClips,
            ParamError::ClipTooShort => WebError::ClipTooShort,
            other => WebError::InvalidParams(other),
        }
    }
}

impl WebError {
    /// True for problems with what the user typed
    pub fn is_validation(&self) -> bool {
        !matches!(self, WebError::Delivery(_) | WebError::TaskAborted(_))
    }

    /// Message shown on the page
    pub fn user_message(&self) -> String {
        match self {
            WebError::Delivery(_) => {
                "An error occurred: the mashup could not be delivered.".to_string()
            }
            WebError::TaskAborted(_) => {
                "An error occurred: the mashup run was interrupted.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for form handling
pub type WebResult<T> = Result<T, WebError>;
