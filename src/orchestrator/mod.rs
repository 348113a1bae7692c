//! Run orchestration
//!
//! A run ties the pieces together: extract work items from the submitted
//! text, route them, warm up every endpoint, dispatch, then notify. The
//! [`Orchestrator`] only holds immutable configuration and the shared
//! transport; everything a run accumulates lives inside that run, so
//! concurrent runs never observe each other.
//!
//! # Gating
//!
//! With [`GateMode::PerEndpoint`] each endpoint's warm-up is a shared
//! future. An item waits only for its own endpoint's warm-up to finish
//! (whatever its final state) before being submitted. With
//! [`GateMode::Legacy`] all warm-ups finish first, followed by one fixed
//! wait if any endpoint needed warming.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::dispatch::{DispatchEngine, GateMode, RoutedItem};
use crate::error::{Error, Result};
use crate::extract::extract_work_items;
use crate::models::{DispatchOutcome, Endpoint, PingReport, RunReport, WarmupResult};
use crate::notify::Notifier;
use crate::routing::EndpointRouter;
use crate::status;
use crate::transport::{HttpTransport, Transport};
use crate::warmup::WarmupOrchestrator;

type WarmupGate = Shared<BoxFuture<'static, WarmupResult>>;

/// Runs the extract → warm up → dispatch → notify pipeline
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    router: EndpointRouter,
    warmup: WarmupOrchestrator,
    dispatch: DispatchEngine,
    notifier: Notifier,
}

impl Orchestrator {
    /// Build an orchestrator over a validated configuration
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let router = EndpointRouter::new(config.endpoint_list(), config.dispatch.match_strategy);
        let warmup = WarmupOrchestrator::new(
            transport.clone(),
            config.warmup.backoff(),
            config.warmup.probe_timeout(),
        )
        .with_deadline(config.warmup.deadline());
        let dispatch = DispatchEngine::new(
            transport.clone(),
            config.dispatch.timeout(),
            config.dispatch.concurrency,
        );
        let notifier = Notifier::new(
            transport.clone(),
            config.notification.address.clone(),
            config.notification.timeout(),
        );

        Ok(Self {
            config: Arc::new(config),
            transport,
            router,
            warmup,
            dispatch,
            notifier,
        })
    }

    /// Build an orchestrator that talks HTTP
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = HttpTransport::new()?;
        Self::new(config, Arc::new(transport))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Names accepted by [`Orchestrator::ping`], scraper endpoints first
    pub fn services(&self) -> Vec<String> {
        self.router
            .endpoints()
            .iter()
            .map(|endpoint| endpoint.name.clone())
            .chain(std::iter::once(self.notifier.endpoint().name))
            .collect()
    }

    /// Run once for `text`, notifying with today's local date
    pub async fn run_today(&self, text: &str) -> RunReport {
        self.run(text, chrono::Local::now().date_naive()).await
    }

    /// Run once for `text`
    ///
    /// Never fails: every remote failure is recorded in the report.
    pub async fn run(&self, text: &str, date: NaiveDate) -> RunReport {
        let span = tracing::info_span!("run", run_id = %Uuid::new_v4());
        self.run_inner(text, date).instrument(span).await
    }

    async fn run_inner(&self, text: &str, date: NaiveDate) -> RunReport {
        let items = extract_work_items(text, self.config.dispatch.duplicate_policy);
        tracing::info!(
            urls = items.len(),
            gate = self.config.dispatch.gate.as_str(),
            "Starting run"
        );

        let routed: Vec<RoutedItem> = items
            .into_iter()
            .map(|item| {
                let endpoint = self.router.route(&item.source_url).cloned();
                (item, endpoint)
            })
            .collect();

        let (warmup, dispatch) = match self.config.dispatch.gate {
            GateMode::PerEndpoint => self.warm_up_and_dispatch_per_endpoint(routed).await,
            GateMode::Legacy => self.warm_up_and_dispatch_legacy(routed).await,
        };

        let notification = self.notifier.notify(date).await;

        let report = RunReport {
            warmup,
            dispatch,
            notification,
        };

        let summary = report.summary();
        tracing::info!(
            endpoints_ready = summary.endpoints_ready,
            endpoints_total = summary.endpoints_total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            unrouted = summary.unrouted,
            notification_sent = summary.notification_sent,
            "Run complete"
        );

        report
    }

    /// Warm-ups run as shared futures; each item waits on its own endpoint
    async fn warm_up_and_dispatch_per_endpoint(
        &self,
        routed: Vec<RoutedItem>,
    ) -> (Vec<WarmupResult>, Vec<DispatchOutcome>) {
        let gates: HashMap<String, WarmupGate> = self
            .router
            .endpoints()
            .iter()
            .map(|endpoint| {
                let warmup = self.warmup.clone();
                let owned = endpoint.clone();
                let gate = async move { warmup.warm_up(&owned).await }
                    .boxed()
                    .shared();
                (endpoint.name.clone(), gate)
            })
            .collect();

        let ordered: Vec<WarmupGate> = self
            .router
            .endpoints()
            .iter()
            .filter_map(|endpoint| gates.get(&endpoint.name).cloned())
            .collect();

        let gate_for = |endpoint: &Endpoint| {
            let gate = gates.get(&endpoint.name).cloned();
            async move {
                if let Some(gate) = gate {
                    let result = gate.await;
                    tracing::debug!(
                        endpoint = %result.endpoint.name,
                        state = result.final_state.as_str(),
                        "Gate open"
                    );
                }
            }
        };

        let notification_endpoint = self.notifier.endpoint();
        let (mut warmup, notification_warmup, dispatch) = tokio::join!(
            join_all(ordered),
            self.warmup.warm_up(&notification_endpoint),
            self.dispatch.dispatch_gated(routed, gate_for),
        );

        warmup.push(notification_warmup);
        (warmup, dispatch)
    }

    /// All warm-ups first, then one fixed wait if anything needed warming
    async fn warm_up_and_dispatch_legacy(
        &self,
        routed: Vec<RoutedItem>,
    ) -> (Vec<WarmupResult>, Vec<DispatchOutcome>) {
        let notification_endpoint = self.notifier.endpoint();
        let (mut warmup, notification_warmup) = tokio::join!(
            self.warmup.warm_up_all(self.router.endpoints()),
            self.warmup.warm_up(&notification_endpoint),
        );

        if warmup.iter().any(|result| !result.was_ready_immediately()) {
            let wait = self.config.dispatch.legacy_wait();
            tracing::info!(
                wait_secs = wait.as_secs(),
                "Some endpoints needed warming, waiting before dispatch"
            );
            tokio::time::sleep(wait).await;
        }

        let dispatch = self.dispatch.dispatch_all(routed).await;

        warmup.push(notification_warmup);
        (warmup, dispatch)
    }

    /// Probe one named service once
    pub async fn ping(&self, service: &str) -> Result<PingReport> {
        let endpoint = self
            .router
            .endpoints()
            .iter()
            .find(|endpoint| endpoint.name == service)
            .cloned()
            .or_else(|| {
                let notification = self.notifier.endpoint();
                (notification.name == service).then_some(notification)
            })
            .ok_or_else(|| Error::UnknownService(service.to_string()))?;

        Ok(status::ping(&self.transport, &endpoint, self.config.warmup.probe_timeout()).await)
    }
}
