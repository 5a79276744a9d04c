//! Mashup web form (mashup-web) - Main entry point
//!
//! Serves the mashup form, runs the pipeline for each valid submission and
//! spools the packaged result into the outbox for delivery.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mashup_common::config::{resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use mashup_common::logging;
use mashup_pipeline::services::{ArchivingNotifier, OutboxTransport};
use mashup_pipeline::WorkflowOrchestrator;
use mashup_web::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for mashup-web
#[derive(Parser, Debug)]
#[command(name = "mashup-web")]
#[command(about = "Web form front-end for the mashup pipeline")]
#[command(version)]
struct Args {
    /// Root folder for the working directories
    #[arg(short, long, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Socket address to listen on (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    logging::init(&config.logging.level);

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    info!("Starting mashup-web v{}", env!("CARGO_PKG_VERSION"));
    info!("Root folder: {}", root_folder.display());

    let orchestrator = WorkflowOrchestrator::from_config(&root_folder, &config);
    orchestrator
        .dirs()
        .create_all()
        .with_context(|| {
            format!(
                "Failed to create working directories under {}",
                root_folder.display()
            )
        })?;

    let outbox = root_folder.join(&config.web.outbox);
    info!("Outbox: {}", outbox.display());
    let notifier = ArchivingNotifier::new(OutboxTransport::new(outbox));

    let state = AppState::new(Arc::new(orchestrator), Arc::new(notifier));
    let app = build_router(state);

    let bind = args.bind.unwrap_or_else(|| config.web.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", bind))?;

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
