//! fanout - cold-start-aware dispatch orchestrator
//!
//! Takes a block of free text, pulls the URLs out of it, routes each URL to
//! the scraper service responsible for its domain, makes sure those
//! (often cold-started) services are awake, submits the work and finally
//! tells a notification service that the run is done.
//!
//! # Architecture
//!
//! - [`extract`] - URL extraction from free text
//! - [`routing`] - keyword → endpoint routing
//! - [`transport`] - outbound HTTP seam ([`transport::Transport`])
//! - [`warmup`] - probe/retry loops with exponential backoff
//! - [`dispatch`] - bounded, gated fan-out of work items
//! - [`notify`] - completion notification
//! - [`status`] - single-probe status checks
//! - [`orchestrator`] - the run pipeline tying the above together
//! - [`server`] - axum HTTP front end
//! - [`config`] - configuration from TOML and environment
//! - [`models`] - report and outcome types
//!
//! # Example
//!
//! ```no_run
//! use fanout::config::Config;
//! use fanout::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let orchestrator = Orchestrator::from_config(config)?;
//!     let report = orchestrator
//!         .run_today("see https://fresheropenings.com/job/1")
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod routing;
pub mod server;
pub mod status;
pub mod transport;
pub mod warmup;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dispatch::GateMode;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::extract::DuplicatePolicy;
    pub use crate::models::{
        DeliveryStatus, DispatchOutcome, DispatchStatus, Endpoint, RunReport, ServiceStatus,
        WarmupResult, WarmupState, WorkItem,
    };
    pub use crate::orchestrator::Orchestrator;
    pub use crate::routing::MatchStrategy;
    pub use crate::transport::{HttpTransport, Transport};
}

pub use models::{RunReport, RunSummary};
