//! Warm-up of cold-started services
//!
//! Each endpoint runs its own retry loop: probe, classify, and on a
//! transient failure sleep and retry with exponential backoff. Loops for
//! different endpoints run concurrently; within one endpoint they are
//! strictly sequential.
//!
//! | Probe result               | Classification     | Loop         |
//! |----------------------------|--------------------|--------------|
//! | 2xx                        | `Ready`            | stops        |
//! | 5xx, timeout, no connection| `TransientFailure` | retries      |
//! | anything else (e.g. 404)   | `PermanentFailure` | stops        |
//!
//! Warm-up is advisory: a result that never reached `Ready` is reported but
//! never stops dispatch.

pub mod backoff;

pub use backoff::BackoffPolicy;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;

use crate::models::{Endpoint, ProbeOutcome, WarmupAttempt, WarmupResult, WarmupState};
use crate::transport::{is_server_error, is_success, Transport, TransportResult};

/// Classify the result of one readiness probe
pub fn classify_probe(result: &TransportResult) -> ProbeOutcome {
    match result {
        Ok(status) if is_success(*status) => ProbeOutcome::Ready { status: *status },
        Ok(status) if is_server_error(*status) => ProbeOutcome::TransientFailure {
            reason: format!("HTTP {status}"),
        },
        Ok(status) => ProbeOutcome::PermanentFailure { status: *status },
        Err(e) => ProbeOutcome::TransientFailure {
            reason: e.to_string(),
        },
    }
}

/// Runs warm-up loops against endpoints
#[derive(Clone)]
pub struct WarmupOrchestrator {
    transport: Arc<dyn Transport>,
    policy: BackoffPolicy,
    probe_timeout: Duration,
    deadline: Option<Duration>,
}

impl WarmupOrchestrator {
    pub fn new(transport: Arc<dyn Transport>, policy: BackoffPolicy, probe_timeout: Duration) -> Self {
        Self {
            transport,
            policy,
            probe_timeout,
            deadline: None,
        }
    }

    /// Bound the total time one endpoint's loop may spend
    ///
    /// A retry is only taken when its sleep plus a full probe timeout still
    /// fits, so a slow probe cannot push the loop past the deadline.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Warm up every endpoint concurrently; results keep the input order
    pub async fn warm_up_all(&self, endpoints: &[Endpoint]) -> Vec<WarmupResult> {
        join_all(endpoints.iter().map(|endpoint| self.warm_up(endpoint))).await
    }

    /// Run the retry loop for a single endpoint
    pub async fn warm_up(&self, endpoint: &Endpoint) -> WarmupResult {
        let started = Instant::now();
        let max_retries = self.policy.max_retries.max(1);
        let mut attempts = Vec::new();
        let mut attempt = 1;

        loop {
            let result = self
                .transport
                .probe(&endpoint.address, self.probe_timeout)
                .await;
            let outcome = classify_probe(&result);

            let (final_state, message) = match &outcome {
                ProbeOutcome::Ready { status } => (
                    WarmupState::Ready,
                    if attempt == 1 {
                        format!("{} is already up (status {status})", endpoint.name)
                    } else {
                        format!(
                            "{} came up after {attempt} attempts (status {status})",
                            endpoint.name
                        )
                    },
                ),
                ProbeOutcome::PermanentFailure { status } => (
                    WarmupState::PermanentFailure,
                    format!("{} responded with status {status}; not retrying", endpoint.name),
                ),
                ProbeOutcome::TransientFailure { reason } if attempt >= max_retries => (
                    WarmupState::Exhausted,
                    format!("{} not ready after {attempt} attempts: {reason}", endpoint.name),
                ),
                ProbeOutcome::TransientFailure { reason } => {
                    let delay = self.policy.delay_for(attempt);
                    let overruns = self
                        .deadline
                        .map(|deadline| {
                            started.elapsed() + delay + self.probe_timeout > deadline
                        })
                        .unwrap_or(false);

                    if overruns {
                        let deadline_ms = self.deadline.unwrap_or_default().as_millis();
                        (
                            WarmupState::Exhausted,
                            format!(
                                "{} not ready: warm-up deadline of {deadline_ms}ms reached after {attempt} attempts",
                                endpoint.name
                            ),
                        )
                    } else {
                        tracing::warn!(
                            endpoint = %endpoint.name,
                            attempt = attempt,
                            max_retries = max_retries,
                            delay_ms = delay.as_millis() as u64,
                            reason = %reason,
                            "Endpoint not ready, backing off"
                        );

                        attempts.push(WarmupAttempt {
                            attempt,
                            outcome: outcome.clone(),
                            backoff_delay_ms: Some(delay.as_millis() as u64),
                        });
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                }
            };

            attempts.push(WarmupAttempt {
                attempt,
                outcome,
                backoff_delay_ms: None,
            });

            match final_state {
                WarmupState::Ready => tracing::info!(endpoint = %endpoint.name, attempts = attempt, "Endpoint ready"),
                _ => tracing::warn!(
                    endpoint = %endpoint.name,
                    attempts = attempt,
                    state = final_state.as_str(),
                    "Endpoint did not warm up"
                ),
            }

            return WarmupResult {
                endpoint: endpoint.clone(),
                final_state,
                attempts,
                message,
            };
        }
    }
}
