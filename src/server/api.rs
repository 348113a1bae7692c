//! REST API handlers

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::health::health_check;
use super::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Body of a run request; `text` is required
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunRequest {
    pub text: String,
}

/// Simple error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(run_form))
        .route("/api/run", post(run_json))
        .route("/ping/{service}", get(ping_service))
        .route("/health", get(health_check))
        .with_state(state)
}

// ============================================================================
// Run Handlers
// ============================================================================

/// Run for a JSON body
async fn run_json(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(request)) => run(state, request).await,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected run request");
            error_response(rejection.status(), rejection.body_text())
        }
    }
}

/// Run for a form post
async fn run_form(
    State(state): State<AppState>,
    payload: Result<Form<RunRequest>, FormRejection>,
) -> Response {
    match payload {
        Ok(Form(request)) => run(state, request).await,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected run request");
            error_response(rejection.status(), rejection.body_text())
        }
    }
}

async fn run(state: AppState, request: RunRequest) -> Response {
    let report = state.orchestrator.run_today(&request.text).await;
    (StatusCode::OK, Json(report)).into_response()
}

// ============================================================================
// Status Handlers
// ============================================================================

/// Single-probe status of one service
async fn ping_service(State(state): State<AppState>, Path(service): Path<String>) -> Response {
    match state.orchestrator.ping(&service).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e @ Error::UnknownService(_)) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
