//! Liveness endpoint
//!
//! Reports only that the process is up; it never probes the remote
//! services (use `/ping/{service}` for that).

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Configured scraper keywords in routing order
    pub endpoints: Vec<String>,
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let endpoints = state
        .orchestrator
        .config()
        .endpoints
        .iter()
        .map(|endpoint| endpoint.keyword.clone())
        .collect();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        endpoints,
    })
}
