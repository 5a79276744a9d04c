//! mashup-pipeline library interface
//!
//! Search → selection → download → normalization → trimming → merge, driven
//! by [`WorkflowOrchestrator`]. External tools sit behind the traits in
//! [`types`] so every stage can be exercised with in-memory backends.

pub mod error;
pub mod models;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::error::{BackendError, CodecError, PipelineError, PipelineResult};
pub use crate::models::{PipelineRun, RunState, WorkDirs};
pub use crate::services::{RunReport, WorkflowOrchestrator};
