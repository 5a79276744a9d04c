//! Utility modules for mashup-pipeline

pub mod audio_decoder;
pub mod process;
pub mod stage_dir;
