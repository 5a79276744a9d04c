//! Mashup workflow orchestrator
//!
//! Coordinates one run through all stages.
//!
//! # State Progression
//! INIT → SELECTING → ACQUIRING → NORMALIZING → TRIMMING → MERGING → DONE
//!
//! # Architecture
//! Each state is handled by a dedicated `phase_*` method in its own module.
//! Stages hand nothing to each other in memory beyond the selection: every
//! stage from Normalizing on re-derives its work set from the stage
//! directories, so re-running after a crash resumes instead of redoing.
//!
//! After Acquiring, Normalizing, Trimming and Merging the run is guarded:
//! a stage that leaves zero usable items moves the run to FAILED. An empty
//! selection is not guarded; it routes Acquiring onto the query fallback.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mashup_common::config::{PipelineSettings, TomlConfig};
use mashup_common::RunParameters;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{AssetInventory, PipelineRun, RunState, WorkDirs};
use crate::services::ffmpeg_codec::FfmpegCodec;
use crate::services::ytdlp_client::YtDlpClient;
use crate::types::{AudioBackend, DownloadBackend, SearchBackend, VideoBackend};

// Phase modules (internal implementation)
mod phase_acquiring;
mod phase_merging;
mod phase_normalizing;
mod phase_selecting;
mod phase_trimming;
pub mod statistics;

pub use statistics::PipelineStatistics;

/// Outcome of [`WorkflowOrchestrator::execute`]
#[derive(Debug)]
pub struct RunReport {
    /// Final run state and transition history
    pub run: PipelineRun,
    pub statistics: PipelineStatistics,
    /// Written output when the run reached DONE
    pub output_path: Option<PathBuf>,
    /// Why the run failed
    pub failure: Option<PipelineError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.run.state == RunState::Done && self.output_path.is_some()
    }
}

/// Workflow orchestrator service
pub struct WorkflowOrchestrator {
    dirs: WorkDirs,
    settings: PipelineSettings,
    search: Box<dyn SearchBackend>,
    downloader: Box<dyn DownloadBackend>,
    audio: Box<dyn AudioBackend>,
    video: Box<dyn VideoBackend>,
}

impl WorkflowOrchestrator {
    /// Create orchestrator over explicit backends
    pub fn new(
        dirs: WorkDirs,
        settings: PipelineSettings,
        search: Box<dyn SearchBackend>,
        downloader: Box<dyn DownloadBackend>,
        audio: Box<dyn AudioBackend>,
        video: Box<dyn VideoBackend>,
    ) -> Self {
        Self {
            dirs,
            settings,
            search,
            downloader,
            audio,
            video,
        }
    }

    /// Create orchestrator with the yt-dlp and ffmpeg backends
    pub fn from_config(root: impl Into<PathBuf>, config: &TomlConfig) -> Self {
        let ytdlp = YtDlpClient::new(&config.tools, config.download.clone());
        let codec = FfmpegCodec::new(&config.tools);

        tracing::debug!(
            yt_dlp = %config.tools.yt_dlp.display(),
            ffmpeg = %config.tools.ffmpeg.display(),
            ffprobe = %config.tools.ffprobe().display(),
            "Backends configured"
        );

        Self::new(
            WorkDirs::new(root),
            config.pipeline.clone(),
            Box::new(ytdlp.clone()),
            Box::new(ytdlp),
            Box::new(codec.clone()),
            Box::new(codec),
        )
    }

    pub fn dirs(&self) -> &WorkDirs {
        &self.dirs
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Execute one complete run
    ///
    /// Never panics on stage failure: the returned report carries the final
    /// state and, for FAILED, the error that stopped the run.
    pub fn execute(&self, params: &RunParameters) -> RunReport {
        let mut run = PipelineRun::new(params.clone());
        let mut statistics = PipelineStatistics::default();

        tracing::info!(
            run_id = %run.run_id,
            performer = %params.performer,
            clip_count = params.clip_count,
            clip_seconds = params.clip_seconds,
            output = %params.output_name,
            root = %self.dirs.root.display(),
            "Starting mashup run"
        );

        let result = self
            .prepare(&run)
            .and_then(|()| self.run_stages(&mut run, &mut statistics));

        let (output_path, failure) = match result {
            Ok(path) => {
                run.transition_to(RunState::Done);
                tracing::info!(
                    run_id = %run.run_id,
                    output = %path.display(),
                    elapsed_seconds = run.elapsed_seconds(),
                    "Mashup run complete"
                );
                (Some(path), None)
            }
            Err(e) => {
                run.transition_to(RunState::Failed);
                tracing::error!(
                    run_id = %run.run_id,
                    stage = ?run.failed_stage,
                    error = %e,
                    "Mashup run failed"
                );
                (None, Some(e))
            }
        };

        for (stage, line) in statistics.summary_lines() {
            tracing::debug!(run_id = %run.run_id, stage, summary = %line, "Stage summary");
        }

        RunReport {
            run,
            statistics,
            output_path,
            failure,
        }
    }

    /// Create the stage directories and log what is already materialized
    fn prepare(&self, run: &PipelineRun) -> PipelineResult<()> {
        self.dirs.create_all()?;

        let inventory = AssetInventory::scan(&self.dirs)?;
        if !inventory.is_empty() {
            let counts = inventory.counts();
            tracing::info!(
                run_id = %run.run_id,
                assets = inventory.len(),
                raw_only = counts.raw,
                normalized = counts.normalized,
                trimmed = counts.trimmed,
                "Resuming: assets already materialized will be skipped"
            );
        }
        Ok(())
    }

    fn run_stages(
        &self,
        run: &mut PipelineRun,
        statistics: &mut PipelineStatistics,
    ) -> PipelineResult<PathBuf> {
        let selection = self.phase_selecting(run, statistics);

        let raw_count = self.phase_acquiring(run, statistics, &selection)?;
        self.guard(run, raw_count)?;

        let normalized = self.phase_normalizing(run, statistics)?;
        self.guard(run, normalized)?;

        let trimmed = self.phase_trimming(run, statistics)?;
        self.guard(run, trimmed)?;

        match self.phase_merging(run, statistics)? {
            Some(path) => Ok(path),
            None => Err(PipelineError::StageEmpty { stage: run.state }),
        }
    }

    /// Stage-boundary guard: the current stage must have produced something
    fn guard(&self, run: &PipelineRun, produced: usize) -> PipelineResult<()> {
        if produced == 0 {
            return Err(PipelineError::StageEmpty { stage: run.state });
        }
        Ok(())
    }

    fn conversion_pause(&self) -> Duration {
        Duration::from_millis(self.settings.conversion_pause_ms)
    }

    fn output_path(&self, run: &PipelineRun) -> PathBuf {
        self.dirs.output_path(&run.params.output_name)
    }

    /// Root of the working directories
    pub fn root(&self) -> &Path {
        &self.dirs.root
    }
}
