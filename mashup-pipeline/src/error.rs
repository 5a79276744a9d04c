//! Error types for mashup-pipeline
//!
//! Backend and codec errors split into two kinds:
//! - item failures (one download or one decode went wrong), which a stage
//!   logs and skips
//! - systemic failures (the tool is not installed, the disk is unwritable),
//!   which abort the stage and the run

use std::path::PathBuf;
use thiserror::Error;

use crate::models::RunState;

/// Search and download backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// Tool binary could not be spawned
    #[error("{tool} not found at {}", .path.display())]
    ToolMissing { tool: &'static str, path: PathBuf },

    /// Tool ran and exited unsuccessfully
    #[error("{tool} failed (exit code {status:?}): {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: Option<i32>,
        stderr: String,
    },

    /// Tool output could not be understood
    #[error("Failed to parse {tool} output: {reason}")]
    Parse { tool: &'static str, reason: String },

    /// I/O error around the tool invocation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// True when only the current item is affected
    pub fn is_item_failure(&self) -> bool {
        matches!(self, Self::CommandFailed { .. } | Self::Parse { .. })
    }
}

/// Audio/video decode and encode errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// Codec binary could not be spawned
    #[error("{tool} not found at {}", .path.display())]
    ToolMissing { tool: &'static str, path: PathBuf },

    /// Input could not be decoded
    #[error("Failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    /// Output could not be encoded
    #[error("Failed to encode {}: {reason}", .path.display())]
    Encode { path: PathBuf, reason: String },

    /// Segment does not share the sample rate / channel layout of the mix
    #[error(
        "Format mismatch: expected {expected_rate} Hz x{expected_channels}, \
         found {found_rate} Hz x{found_channels}"
    )]
    FormatMismatch {
        expected_rate: u32,
        expected_channels: u16,
        found_rate: u32,
        found_channels: u16,
    },

    /// I/O error while moving media files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// True when only the current item is affected
    pub fn is_item_failure(&self) -> bool {
        !matches!(self, Self::ToolMissing { .. })
    }
}

/// Pipeline run errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage yielded zero usable items
    #[error("{stage} stage produced no usable items")]
    StageEmpty { stage: RunState },

    /// Search/download backend failure outside a single item
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Codec failure outside a single item
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Working directory I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// mashup-common error
    #[error(transparent)]
    Common(#[from] mashup_common::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
