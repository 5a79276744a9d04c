//! Pipeline seam used by the form handler

use std::path::PathBuf;

use mashup_common::RunParameters;
use mashup_pipeline::{PipelineError, WorkflowOrchestrator};

/// Runs one mashup to completion on the calling thread
///
/// Called from tokio's blocking pool; implementations may block for as long
/// as the run takes.
pub trait MashupRunner: Send + Sync {
    /// Run the pipeline and return the written output
    fn run(&self, params: &RunParameters) -> Result<PathBuf, PipelineError>;
}

impl MashupRunner for WorkflowOrchestrator {
    fn run(&self, params: &RunParameters) -> Result<PathBuf, PipelineError> {
        let report = self.execute(params);
        match (report.output_path, report.failure) {
            (Some(path), _) => Ok(path),
            (None, Some(err)) => Err(err),
            (None, None) => Err(PipelineError::StageEmpty {
                stage: report.run.failed_stage.unwrap_or(report.run.state),
            }),
        }
    }
}
