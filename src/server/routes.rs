//! HTTP route handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;

use crate::llm::{LlmError, LlmResult};
use crate::prompt::PromptRequest;
use crate::submission::{Submission, respond};

use super::state::AppState;

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health_check))
        .route("/api/generate", post(generate))
        .with_state(state)
}

/// Run blocking model work off the async executor.
async fn run_blocking<T, F>(work: F) -> LlmResult<T>
where
    F: FnOnce() -> LlmResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| LlmError::Task(e.to_string()))?
}

fn internal_error(context: &str, err: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{context}: {err}"))
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "instruct-web",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.adapter.model_name(),
    }))
}

/// Page before any submission.
async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, (StatusCode, String)> {
    state
        .page
        .render(&Submission::default(), None, state.adapter.model_name())
        .map(Html)
        .map_err(|e| internal_error("Render error", e))
}

/// Page after pressing submit: one generation, answer shown.
async fn submit(
    State(state): State<Arc<AppState>>,
    Form(mut submission): Form<Submission>,
) -> Result<Html<String>, (StatusCode, String)> {
    submission.clicks = submission.clicks.saturating_add(1);

    let adapter = Arc::clone(&state.adapter);
    let pending = submission.clone();
    let answer = run_blocking(move || respond(&adapter, &pending))
        .await
        .map_err(|e| internal_error("LLM error", e))?;

    state
        .page
        .render(&submission, answer.as_deref(), state.adapter.model_name())
        .map(Html)
        .map_err(|e| internal_error("Render error", e))
}

/// Generation response.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Extracted answer.
    pub answer: String,
    /// Model used.
    pub model: String,
    /// Wall-clock generation time.
    pub elapsed_ms: u64,
}

/// Handle JSON generation requests.
async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let started = Instant::now();
    let adapter = Arc::clone(&state.adapter);
    let answer = run_blocking(move || adapter.answer(&request))
        .await
        .map_err(|e| internal_error("LLM error", e))?;

    Ok(Json(GenerateResponse {
        answer,
        model: state.adapter.model_name().to_string(),
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }))
}
