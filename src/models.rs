// Core data structures for one orchestration run

use serde::{Deserialize, Serialize};
use std::fmt;

/// A remote scraper (or downstream) service reachable at a fixed address.
///
/// `name` doubles as the routing keyword and as the label used in warm-up
/// reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub address: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// One URL extracted from the submitted text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    pub source_url: String,
}

impl WorkItem {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
        }
    }
}

// ============================================================================
// Warm-up
// ============================================================================

/// Classification of a single readiness probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// 2xx response
    Ready { status: u16 },
    /// 5xx response or transport failure; eligible for retry
    TransientFailure { reason: String },
    /// Any other status; never retried
    PermanentFailure { status: u16 },
}

impl ProbeOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFailure { .. })
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready { status } => write!(f, "ready (status {status})"),
            Self::TransientFailure { reason } => write!(f, "transient failure: {reason}"),
            Self::PermanentFailure { status } => write!(f, "permanent failure (status {status})"),
        }
    }
}

/// One probe inside an endpoint's retry loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupAttempt {
    /// 1-based attempt number
    pub attempt: u32,
    pub outcome: ProbeOutcome,
    /// Sleep taken after this attempt before the next one, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_delay_ms: Option<u64>,
}

/// Terminal state of an endpoint's warm-up loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupState {
    Ready,
    /// Retries (or the deadline) ran out while failures stayed transient
    Exhausted,
    /// A non-retryable status ended the loop
    PermanentFailure,
}

impl WarmupState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Exhausted => "exhausted",
            Self::PermanentFailure => "permanent_failure",
        }
    }
}

/// Warm-up record for one endpoint in one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupResult {
    pub endpoint: Endpoint,
    pub final_state: WarmupState,
    pub attempts: Vec<WarmupAttempt>,
    pub message: String,
}

impl WarmupResult {
    pub fn is_ready(&self) -> bool {
        self.final_state == WarmupState::Ready
    }

    /// Whether the very first probe already found the service up
    pub fn was_ready_immediately(&self) -> bool {
        self.attempts
            .first()
            .map(|a| a.outcome.is_ready())
            .unwrap_or(false)
    }
}

// ============================================================================
// Dispatch and notification
// ============================================================================

/// Classification of a submission (dispatch or notification)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Success,
    RemoteFailure { code: u16 },
    TransportError { message: String },
}

impl DeliveryStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::RemoteFailure { code } => write!(f, "failed ({code})"),
            Self::TransportError { message } => write!(f, "error: {message}"),
        }
    }
}

/// Result of dispatching one work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchStatus {
    Success,
    RemoteFailure { code: u16 },
    TransportError { message: String },
    /// No configured endpoint matched; no request was made
    Unrouted,
}

impl From<DeliveryStatus> for DispatchStatus {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Success => Self::Success,
            DeliveryStatus::RemoteFailure { code } => Self::RemoteFailure { code },
            DeliveryStatus::TransportError { message } => Self::TransportError { message },
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::RemoteFailure { code } => write!(f, "failed ({code})"),
            Self::TransportError { message } => write!(f, "error: {message}"),
            Self::Unrouted => write!(f, "no matching server"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub item: WorkItem,
    pub endpoint: Option<Endpoint>,
    pub status: DispatchStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    /// `YYYY-MM-DD`
    pub date: String,
    pub status: DeliveryStatus,
}

// ============================================================================
// Report
// ============================================================================

/// Complete record of one orchestration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Configured endpoints in order, then the notification service
    pub warmup: Vec<WarmupResult>,
    /// One entry per extracted URL, in extraction order
    pub dispatch: Vec<DispatchOutcome>,
    pub notification: NotificationResult,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            endpoints_ready: self.warmup.iter().filter(|w| w.is_ready()).count(),
            endpoints_total: self.warmup.len(),
            items_total: self.dispatch.len(),
            notification_sent: self.notification.status.is_success(),
            ..Default::default()
        };

        for outcome in &self.dispatch {
            match outcome.status {
                DispatchStatus::Success => summary.succeeded += 1,
                DispatchStatus::Unrouted => summary.unrouted += 1,
                _ => summary.failed += 1,
            }
        }

        summary
    }
}

/// Aggregate counts for log lines and CLI output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub endpoints_ready: usize,
    pub endpoints_total: usize,
    pub items_total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unrouted: usize,
    pub notification_sent: bool,
}

// ============================================================================
// Status probe
// ============================================================================

/// Coarse availability from a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Starting,
    Offline,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Starting => "starting",
            Self::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingReport {
    pub service: String,
    pub address: String,
    pub status: ServiceStatus,
    pub detail: String,
}
