//! Completion notification
//!
//! Fired exactly once per run after dispatch has finished, whatever the
//! dispatch outcomes were and whether or not the notification service
//! warmed up.
//!
//! # Payload Format
//!
//! `POST <address>/send-notifications`
//!
//! ```json
//! { "date": "2024-01-15" }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::dispatch::classify_delivery;
use crate::models::{Endpoint, NotificationResult};
use crate::transport::Transport;

/// Path appended to the notification service address
pub const SEND_PATH: &str = "/send-notifications";

/// Name under which the notification service appears in reports and pings
pub const SERVICE_NAME: &str = "notifications";

/// Sends the completion notification
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
    address: String,
    timeout: Duration,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>, address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            address: address.into(),
            timeout,
        }
    }

    /// Base address of the notification service
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The notification service as an endpoint, for warm-up and pings
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(SERVICE_NAME, self.address.clone())
    }

    /// Full URL the notification is posted to
    pub fn send_url(&self) -> String {
        format!("{}{SEND_PATH}", self.address.trim_end_matches('/'))
    }

    /// Build the notification payload
    fn build_payload(date: &str) -> serde_json::Value {
        serde_json::json!({ "date": date })
    }

    /// Send the notification for `date`
    pub async fn notify(&self, date: NaiveDate) -> NotificationResult {
        let date = date.format("%Y-%m-%d").to_string();
        let url = self.send_url();

        let result = self
            .transport
            .submit_json(&url, &Self::build_payload(&date), self.timeout)
            .await;
        let status = classify_delivery(&result);

        if status.is_success() {
            tracing::info!(url = %url, date = %date, "Notification sent");
        } else {
            tracing::error!(url = %url, date = %date, status = %status, "Notification failed");
        }

        NotificationResult { date, status }
    }
}
