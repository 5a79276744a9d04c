//! Mashup form: GET renders it, POST validates, runs and delivers

use std::path::PathBuf;

use axum::{
    extract::State,
    response::Html,
    routing::get,
    Form, Router,
};
use chrono::Local;
use mashup_common::run_params::is_valid_email;
use mashup_common::time::stamped_output_name;
use mashup_common::RunParameters;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::page::{render_page, NoticeKind};
use crate::error::{WebError, WebResult};
use crate::AppState;

/// Shown after a successful run and delivery
pub const SUCCESS_MESSAGE: &str = "Mashup created and sent to your email!";

/// Shown when the run finished without an output file
pub const NO_OUTPUT_MESSAGE: &str = "Failed to create mashup. Please try again.";

/// Prefix of every output written from the form
const OUTPUT_PREFIX: &str = "mashup";

/// Submitted form fields
///
/// Missing fields deserialize as empty so they hit the "required" check
/// instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MashupForm {
    pub singer: String,
    pub num: String,
    pub duration: String,
    pub email: String,
}

/// What a validated submission asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MashupRequest {
    pub params: RunParameters,
    pub email: String,
}

/// Validate a submission in the order the page reports problems
pub fn validate(form: &MashupForm, output_name: &str) -> WebResult<MashupRequest> {
    let singer = form.singer.trim();
    let num = form.num.trim();
    let duration = form.duration.trim();
    let email = form.email.trim();

    if singer.is_empty() || num.is_empty() || duration.is_empty() || email.is_empty() {
        return Err(WebError::MissingField);
    }
    if !is_valid_email(email) {
        return Err(WebError::InvalidEmail);
    }

    let params = RunParameters::parse(singer, num, duration, output_name)?;
    Ok(MashupRequest {
        params,
        email: email.to_string(),
    })
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum RunOutcome {
    Delivered,
    NoOutput,
}

/// GET /
pub async fn form_page() -> Html<String> {
    Html(render_page(None))
}

/// POST /
pub async fn submit_form(
    State(state): State<AppState>,
    Form(form): Form<MashupForm>,
) -> Html<String> {
    let output_name = stamped_output_name(OUTPUT_PREFIX, Local::now());

    let request = match validate(&form, &output_name) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected mashup form");
            return Html(render_page(Some((NoticeKind::Error, &e.user_message()))));
        }
    };

    match run_and_deliver(&state, request).await {
        Ok(RunOutcome::Delivered) => {
            Html(render_page(Some((NoticeKind::Success, SUCCESS_MESSAGE))))
        }
        Ok(RunOutcome::NoOutput) => Html(render_page(Some((NoticeKind::Error, NO_OUTPUT_MESSAGE)))),
        Err(e) => {
            error!(error = %e, "Mashup request failed");
            state.record_error(e.to_string()).await;
            Html(render_page(Some((NoticeKind::Error, &e.user_message()))))
        }
    }
}

/// Run the pipeline on the blocking pool, then deliver the output
///
/// The run lock is owned by the blocking task, so it stays held until the
/// run finishes even when the client goes away and this future is dropped.
async fn run_and_deliver(state: &AppState, request: MashupRequest) -> WebResult<RunOutcome> {
    let guard = state.run_lock.clone().lock_owned().await;

    info!(
        performer = %request.params.performer,
        clip_count = request.params.clip_count,
        clip_seconds = request.params.clip_seconds,
        output = %request.params.output_name,
        "Starting mashup from form"
    );

    let runner = state.runner.clone();
    let notifier = state.notifier.clone();

    let task = tokio::task::spawn_blocking(move || -> WebResult<RunOutcome> {
        let _guard = guard;
        let output: Option<PathBuf> = match runner.run(&request.params) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Mashup run produced no output");
                None
            }
        };

        match output {
            Some(path) if path.is_file() => {
                let receipt = notifier.deliver(&path, &request.email)?;
                info!(
                    message_id = %receipt.message_id,
                    archive = %receipt.archive_path.display(),
                    "Mashup delivered"
                );
                Ok(RunOutcome::Delivered)
            }
            _ => Ok(RunOutcome::NoOutput),
        }
    });

    task.await
        .map_err(|e| WebError::TaskAborted(e.to_string()))?
}

/// Build form routes
pub fn form_routes() -> Router<AppState> {
    Router::new().route("/", get(form_page).post(submit_form))
}
