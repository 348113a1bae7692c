//! Single-probe availability check
//!
//! A read-only diagnostic: one probe, no retry, mapped to
//! `active` / `starting` / `offline`. Not part of the dispatch path.

use std::sync::Arc;
use std::time::Duration;

use crate::models::{Endpoint, PingReport, ServiceStatus};
use crate::transport::{is_server_error, is_success, Transport, TransportErrorKind, TransportResult};

/// Map one probe result onto a coarse status with a human-readable detail
///
/// A timeout or 5xx is what a cold-starting host typically returns, so both
/// count as `starting`. Refused connections and other statuses are `offline`.
pub fn classify_status(result: &TransportResult) -> (ServiceStatus, String) {
    match result {
        Ok(status) if is_success(*status) => (ServiceStatus::Active, format!("status {status}")),
        Ok(status) if is_server_error(*status) => {
            (ServiceStatus::Starting, format!("status {status}"))
        }
        Ok(status) => (ServiceStatus::Offline, format!("status {status}")),
        Err(e) if e.kind == TransportErrorKind::Timeout => {
            (ServiceStatus::Starting, e.message.clone())
        }
        Err(e) => (ServiceStatus::Offline, e.message.clone()),
    }
}

/// Probe an endpoint once and report its status
pub async fn ping(
    transport: &Arc<dyn Transport>,
    endpoint: &Endpoint,
    timeout: Duration,
) -> PingReport {
    let result = transport.probe(&endpoint.address, timeout).await;
    let (status, detail) = classify_status(&result);

    tracing::info!(
        service = %endpoint.name,
        status = status.as_str(),
        detail = %detail,
        "Ping"
    );

    PingReport {
        service: endpoint.name.clone(),
        address: endpoint.address.clone(),
        status,
        detail,
    }
}
