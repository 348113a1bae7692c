//! Delivery of work items to their routed endpoints
//!
//! One form submission per routed item, no retry. Items are independent:
//! they run with bounded concurrency and each records its own outcome.
//! Outcomes come back in input order regardless of completion order.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::models::{DeliveryStatus, DispatchOutcome, DispatchStatus, Endpoint, WorkItem};
use crate::transport::{is_success, Transport, TransportResult};

/// When dispatch may start relative to warm-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    /// Each item waits only for its own endpoint's warm-up to resolve
    #[default]
    PerEndpoint,
    /// Wait for every warm-up, then a fixed delay if any endpoint needed
    /// warming, then dispatch everything
    Legacy,
}

impl GateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerEndpoint => "per_endpoint",
            Self::Legacy => "legacy",
        }
    }
}

impl FromStr for GateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_endpoint" | "per-endpoint" => Ok(Self::PerEndpoint),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown gate mode: {other}")),
        }
    }
}

/// Classify the result of a submission
pub fn classify_delivery(result: &TransportResult) -> DeliveryStatus {
    match result {
        Ok(status) if is_success(*status) => DeliveryStatus::Success,
        Ok(status) => DeliveryStatus::RemoteFailure { code: *status },
        Err(e) => DeliveryStatus::TransportError {
            message: e.to_string(),
        },
    }
}

/// A work item paired with the endpoint the router chose for it
pub type RoutedItem = (WorkItem, Option<Endpoint>);

/// Submits work items to endpoints
#[derive(Clone)]
pub struct DispatchEngine {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    concurrency: usize,
}

impl DispatchEngine {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            transport,
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Deliver one item; unrouted items never touch the network
    pub async fn dispatch_one(&self, item: WorkItem, endpoint: Option<Endpoint>) -> DispatchOutcome {
        let Some(endpoint) = endpoint else {
            tracing::info!(url = %item.source_url, "No matching server");
            return DispatchOutcome {
                item,
                endpoint: None,
                status: DispatchStatus::Unrouted,
            };
        };

        let result = self
            .transport
            .submit_form(
                &endpoint.address,
                &[("url", item.source_url.as_str())],
                self.timeout,
            )
            .await;
        let status = DispatchStatus::from(classify_delivery(&result));

        match &status {
            DispatchStatus::Success => {
                tracing::info!(url = %item.source_url, endpoint = %endpoint.name, "Dispatched")
            }
            other => tracing::warn!(
                url = %item.source_url,
                endpoint = %endpoint.name,
                status = %other,
                "Dispatch failed"
            ),
        }

        DispatchOutcome {
            item,
            endpoint: Some(endpoint),
            status,
        }
    }

    /// Deliver all items without waiting on anything else
    pub async fn dispatch_all(&self, items: Vec<RoutedItem>) -> Vec<DispatchOutcome> {
        self.dispatch_gated(items, |_| futures::future::ready(())).await
    }

    /// Deliver all items, holding each routed item until `gate(endpoint)`
    /// resolves
    ///
    /// Waiting on a gate does not occupy a concurrency slot, so a slow
    /// endpoint's warm-up never holds back items bound for other endpoints.
    pub async fn dispatch_gated<G, GF>(&self, items: Vec<RoutedItem>, gate: G) -> Vec<DispatchOutcome>
    where
        G: Fn(&Endpoint) -> GF,
        GF: Future<Output = ()>,
    {
        if items.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let total = items.len();

        let mut indexed = stream::iter(items.into_iter().enumerate())
            .map(|(index, (item, endpoint))| {
                let gate = endpoint.as_ref().map(&gate);
                let semaphore = semaphore.clone();

                async move {
                    if let Some(gate) = gate {
                        gate.await;
                    }

                    // Only routed items make a network call and need a slot
                    let _permit = match endpoint {
                        Some(_) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };

                    (index, self.dispatch_one(item, endpoint).await)
                }
            })
            .buffer_unordered(total)
            .collect::<Vec<_>>()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
