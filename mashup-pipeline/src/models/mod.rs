//! Data models for mashup-pipeline

pub mod asset;
pub mod audio_clip;
pub mod pipeline_run;
pub mod search_result;

pub use asset::{AssetInventory, AssetStatus, WorkDirs, CANONICAL_EXTENSION};
pub use audio_clip::AudioClip;
pub use pipeline_run::{PipelineRun, RunState, StateTransition};
pub use search_result::{Candidate, SearchResult, SelectionTier};
