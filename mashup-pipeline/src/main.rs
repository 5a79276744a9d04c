//! mashup - command-line pipeline run
//!
//! Builds one mashup from N clips of a performer:
//! search → selection → download → normalization → trimming → merge.
//!
//! Exit status is 0 when the output file was written and 1 for any failure
//! (invalid arguments, a stage that produced nothing, missing tools).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};

use mashup_common::config::{self, TomlConfig, ROOT_FOLDER_ENV};
use mashup_common::RunParameters;
use mashup_pipeline::WorkflowOrchestrator;

/// Command-line arguments for mashup
#[derive(Parser, Debug)]
#[command(name = "mashup")]
#[command(about = "Build an audio mashup from a performer's videos")]
#[command(version)]
struct Args {
    /// Performer name, used as the search query
    singer: String,

    /// Number of clips to gather (must be greater than 10)
    #[arg(allow_hyphen_values = true)]
    num_videos: String,

    /// Seconds kept from the start of each clip (must be greater than 20)
    #[arg(allow_hyphen_values = true)]
    duration: String,

    /// Output file name (".mp3" is appended when missing)
    output: String,

    /// Working folder holding downloads/, audio/, trimmed/ and output/
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_status(&e));
        }
    };

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            // No-op when logging is already up; covers config load failures
            mashup_common::logging::init("info");
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Exit status for an argument error: 0 for --help/--version, 1 otherwise
fn usage_exit_status(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn run(args: Args) -> Result<bool> {
    let toml_config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    mashup_common::logging::init(&toml_config.logging.level);

    let parsed =
        RunParameters::parse(&args.singer, &args.num_videos, &args.duration, &args.output);
    let params = match parsed {
        Ok(params) => params,
        Err(e) => {
            error!("{}", e);
            return Ok(false);
        }
    };

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    info!("Root folder: {}", root_folder.display());

    let orchestrator = WorkflowOrchestrator::from_config(root_folder, &toml_config);
    orchestrator
        .dirs()
        .create_all()
        .with_context(|| {
            format!(
                "Failed to create working folders under {}",
                orchestrator.root().display()
            )
        })?;

    let report = orchestrator.execute(&params);

    match (report.output_path, report.failure) {
        (Some(path), _) => {
            info!("Done. Mashup saved to {}", path.display());
            Ok(true)
        }
        (None, Some(failure)) => {
            error!("Mashup failed: {}", failure);
            Ok(false)
        }
        (None, None) => {
            error!("Mashup failed: no output produced");
            Ok(false)
        }
    }
}
