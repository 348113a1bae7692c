//! Common test utilities

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use fanout::config::{Config, EndpointConfig};
use fanout::dispatch::GateMode;
use fanout::transport::{Transport, TransportResult};

pub const SCRAPER_1: &str = "http://scraper-1.test";
pub const SCRAPER_2: &str = "http://scraper-2.test";
pub const SCRAPER_3: &str = "http://scraper-3.test";
pub const NOTIFY: &str = "http://notify.test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Probe,
    Form,
    Json,
}

/// One outbound call seen by [`ScriptedTransport`]
#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub address: String,
    pub body: String,
    /// Time since the transport was created (virtual under paused time)
    pub at: Duration,
}

/// Transport with per-address scripted responses
///
/// Probe scripts are consumed front to back; the last entry repeats.
/// Anything unscripted answers 200.
pub struct ScriptedTransport {
    probes: Mutex<HashMap<String, VecDeque<TransportResult>>>,
    submits: Mutex<HashMap<String, TransportResult>>,
    calls: Mutex<Vec<Call>>,
    created: Instant,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            probes: Mutex::new(HashMap::new()),
            submits: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            created: Instant::now(),
        }
    }

    pub fn probe(self, address: &str, results: Vec<TransportResult>) -> Self {
        self.probes
            .lock()
            .unwrap()
            .insert(address.to_string(), results.into());
        self
    }

    /// Result for form and JSON submissions to `address`
    pub fn submit(self, address: &str, result: TransportResult) -> Self {
        self.submits
            .lock()
            .unwrap()
            .insert(address.to_string(), result);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind == kind)
            .collect()
    }

    pub fn probes_to(&self, address: &str) -> usize {
        self.calls_of(CallKind::Probe)
            .iter()
            .filter(|call| call.address == address)
            .count()
    }

    fn record(&self, kind: CallKind, address: &str, body: String) {
        self.calls.lock().unwrap().push(Call {
            kind,
            address: address.to_string(),
            body,
            at: self.created.elapsed(),
        });
    }

    fn submit_result(&self, address: &str) -> TransportResult {
        self.submits
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or(Ok(200))
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn probe(&self, address: &str, _timeout: Duration) -> TransportResult {
        self.record(CallKind::Probe, address, String::new());

        let mut probes = self.probes.lock().unwrap();
        match probes.get_mut(address) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or(Ok(200)),
            Some(script) => script.front().cloned().unwrap_or(Ok(200)),
            None => Ok(200),
        }
    }

    async fn submit_form(
        &self,
        address: &str,
        fields: &[(&str, &str)],
        _timeout: Duration,
    ) -> TransportResult {
        let body = fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        self.record(CallKind::Form, address, body);
        self.submit_result(address)
    }

    async fn submit_json(
        &self,
        address: &str,
        body: &serde_json::Value,
        _timeout: Duration,
    ) -> TransportResult {
        self.record(CallKind::Json, address, body.to_string());
        self.submit_result(address)
    }
}

/// The three scraper endpoints plus the notification service, all local
pub fn test_config(gate: GateMode) -> Config {
    let mut config = Config::default();
    config.endpoints = vec![
        EndpointConfig {
            keyword: "fresheropenings.com".to_string(),
            address: SCRAPER_1.to_string(),
        },
        EndpointConfig {
            keyword: "fresherscareers.com".to_string(),
            address: SCRAPER_2.to_string(),
        },
        EndpointConfig {
            keyword: "fresherscamp.com".to_string(),
            address: SCRAPER_3.to_string(),
        },
    ];
    config.notification.address = NOTIFY.to_string();
    config.dispatch.gate = gate;
    config
}

pub fn notify_url() -> String {
    format!("{NOTIFY}/send-notifications")
}
