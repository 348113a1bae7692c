//! HTTP front end
//!
//! Thin axum layer over [`Orchestrator`]: one run per inbound request, plus
//! the status probe and a health check.
//!
//! ```text
//! POST /api/run          {"text": "..."}      -> RunReport
//! POST /                 text=... (form)      -> RunReport
//! GET  /ping/{service}                        -> PingReport
//! GET  /health                                -> HealthResponse
//! ```

pub mod api;
pub mod health;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::orchestrator::Orchestrator;

pub use api::{create_router, ErrorResponse, RunRequest};
pub use health::HealthResponse;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Run pipeline; immutable and shared by every request
    pub orchestrator: Arc<Orchestrator>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server wrapping an orchestrator
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(orchestrator: Orchestrator, config: ServerConfig) -> Self {
        Self {
            config,
            state: AppState::new(orchestrator),
        }
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes and enabled layers
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| Error::Server(format!("failed to bind {}: {e}", self.config.bind_address)))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            services = ?self.state.orchestrator.services(),
            "Starting HTTP server"
        );

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        tracing::info!("HTTP server shutdown complete");
        Ok(())
    }
}
