//! mashup-web library interface
//!
//! Form front-end for the mashup pipeline. Exposes the router and state so
//! integration tests can drive it without binding a socket.

pub mod api;
pub mod error;
pub mod runner;

pub use crate::error::{WebError, WebResult};
pub use crate::runner::MashupRunner;

use axum::Router;
use chrono::{DateTime, Utc};
use mashup_pipeline::services::Notifier;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs the pipeline for a validated form
    pub runner: Arc<dyn MashupRunner>,
    /// Delivers finished mashups to the submitter
    pub notifier: Arc<dyn Notifier>,
    /// Held for the whole of a run; one run at a time per process
    pub run_lock: Arc<Mutex<()>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(runner: Arc<dyn MashupRunner>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            runner,
            notifier,
            run_lock: Arc::new(Mutex::new(())),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember `message` for /health
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::form_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
