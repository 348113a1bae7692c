//! Outbound HTTP capability
//!
//! Every network call the orchestrator makes goes through [`Transport`]:
//! a readiness probe, a form submission (dispatch), and a JSON submission
//! (notification). Each call carries its own timeout and reports either the
//! HTTP status code or a [`TransportError`]; classifying the status is left
//! to the caller.
//!
//! [`HttpTransport`] is the `reqwest` implementation. Tests substitute their
//! own implementation to script responses and count calls.

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Coarse cause of a transport-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The call did not complete within its timeout
    Timeout,
    /// Connection refused, DNS failure, TLS failure
    Connect,
    /// Anything else (body, redirect, protocol errors)
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connect => write!(f, "connect"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Network-level failure: no HTTP status was received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, error_chain(&err))
    }
}

/// `err` followed by each distinct cause, so "connection refused" and
/// "dns error" survive reqwest's generic top-level message
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

pub type TransportResult = Result<u16, TransportError>;

/// Outbound calls used by warm-up, dispatch and notification
#[async_trait]
pub trait Transport: Send + Sync {
    /// Idempotent GET against `address`
    async fn probe(&self, address: &str, timeout: Duration) -> TransportResult;

    /// POST `fields` as `application/x-www-form-urlencoded`
    async fn submit_form(
        &self,
        address: &str,
        fields: &[(&str, &str)],
        timeout: Duration,
    ) -> TransportResult;

    /// POST `body` as JSON
    async fn submit_json(
        &self,
        address: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> TransportResult;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a default client
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be created
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(format!("fanout/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn probe(&self, address: &str, timeout: Duration) -> TransportResult {
        tracing::debug!(address = %address, timeout_ms = timeout.as_millis() as u64, "Probing");

        let response = self.client.get(address).timeout(timeout).send().await?;
        Ok(response.status().as_u16())
    }

    async fn submit_form(
        &self,
        address: &str,
        fields: &[(&str, &str)],
        timeout: Duration,
    ) -> TransportResult {
        tracing::debug!(address = %address, "Submitting form");

        let response = self
            .client
            .post(address)
            .form(fields)
            .timeout(timeout)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn submit_json(
        &self,
        address: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> TransportResult {
        tracing::debug!(address = %address, "Submitting JSON");

        let response = self
            .client
            .post(address)
            .json(body)
            .timeout(timeout)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}

/// 2xx
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// 5xx
pub fn is_server_error(status: u16) -> bool {
    (500..600).contains(&status)
}
