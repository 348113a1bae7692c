//! Run reports: routing, dispatch outcomes and the notification step

use chrono::NaiveDate;

use fanout::dispatch::GateMode;
use fanout::error::Error;
use fanout::extract::DuplicatePolicy;
use fanout::models::{DeliveryStatus, DispatchStatus, ServiceStatus};
use fanout::orchestrator::Orchestrator;
use fanout::routing::MatchStrategy;
use fanout::transport::TransportError;

use crate::common::{notify_url, test_config, CallKind, ScriptedTransport, NOTIFY, SCRAPER_1, SCRAPER_3};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_routed_and_unrouted_items() {
    let transport = ScriptedTransport::new()
        .submit(&notify_url(), Ok(503))
        .build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator
        .run(
            "check https://fresheropenings.com/job/1 and https://unknown.example/x",
            date(),
        )
        .await;

    assert_eq!(report.dispatch.len(), 2);

    let first = &report.dispatch[0];
    assert_eq!(first.item.source_url, "https://fresheropenings.com/job/1");
    assert_eq!(first.status, DispatchStatus::Success);
    assert_eq!(first.endpoint.as_ref().unwrap().address, SCRAPER_1);

    let second = &report.dispatch[1];
    assert_eq!(second.item.source_url, "https://unknown.example/x");
    assert_eq!(second.status, DispatchStatus::Unrouted);
    assert!(second.endpoint.is_none());

    // The notification reflects its own response, not the dispatch outcomes
    assert_eq!(report.notification.date, "2024-01-15");
    assert_eq!(
        report.notification.status,
        DeliveryStatus::RemoteFailure { code: 503 }
    );

    let forms = transport.calls_of(CallKind::Form);
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].address, SCRAPER_1);
    assert_eq!(forms[0].body, "url=https://fresheropenings.com/job/1");

    let notifications = transport.calls_of(CallKind::Json);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].address, notify_url());
    assert!(notifications[0].body.contains("2024-01-15"));
}

#[tokio::test(start_paused = true)]
async fn test_warmup_covers_every_endpoint_and_notifications() {
    let transport = ScriptedTransport::new().build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator.run("no links here", date()).await;

    let names: Vec<_> = report
        .warmup
        .iter()
        .map(|w| w.endpoint.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "fresheropenings.com",
            "fresherscareers.com",
            "fresherscamp.com",
            "notifications"
        ]
    );
    assert_eq!(transport.probes_to(NOTIFY), 1);
    assert!(report.warmup.iter().all(|w| w.is_ready()));
}

#[tokio::test(start_paused = true)]
async fn test_empty_text_still_notifies() {
    let transport = ScriptedTransport::new().build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator.run("", date()).await;

    assert!(report.dispatch.is_empty());
    assert_eq!(report.notification.status, DeliveryStatus::Success);
    assert!(transport.calls_of(CallKind::Form).is_empty());
    assert_eq!(transport.calls_of(CallKind::Json).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_recorded_not_raised() {
    let transport = ScriptedTransport::new()
        .submit(SCRAPER_1, Err(TransportError::timeout("operation timed out")))
        .submit(SCRAPER_3, Ok(500))
        .build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator
        .run(
            "https://fresheropenings.com/a https://fresherscamp.com/b",
            date(),
        )
        .await;

    assert_eq!(
        report.dispatch[0].status,
        DispatchStatus::TransportError {
            message: "operation timed out".to_string()
        }
    );
    assert_eq!(
        report.dispatch[1].status,
        DispatchStatus::RemoteFailure { code: 500 }
    );
    assert_eq!(report.notification.status, DeliveryStatus::Success);

    let summary = report.summary();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 0);
    assert!(summary.notification_sent);
}

#[tokio::test(start_paused = true)]
async fn test_notification_is_the_last_call() {
    let transport = ScriptedTransport::new().build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    orchestrator
        .run(
            "https://fresheropenings.com/a https://fresherscareers.com/b https://fresherscamp.com/c",
            date(),
        )
        .await;

    let calls = transport.calls();
    assert_eq!(calls.last().unwrap().kind, CallKind::Json);
    assert_eq!(transport.calls_of(CallKind::Form).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_runs_produce_equal_reports() {
    let transport = ScriptedTransport::new().build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();
    let text = "https://fresheropenings.com/a https://other.example/b https://fresherscamp.com/c";

    let first = orchestrator.run(text, date()).await;
    let second = orchestrator.run(text, date()).await;

    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_runs_are_independent() {
    let transport = ScriptedTransport::new().build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let (left, right) = tokio::join!(
        orchestrator.run("https://fresheropenings.com/left", date()),
        orchestrator.run(
            "https://fresherscamp.com/right https://unknown.example/x",
            date()
        ),
    );

    assert_eq!(left.dispatch.len(), 1);
    assert_eq!(left.dispatch[0].item.source_url, "https://fresheropenings.com/left");
    assert_eq!(right.dispatch.len(), 2);
    assert_eq!(right.dispatch[0].item.source_url, "https://fresherscamp.com/right");
    assert_eq!(transport.calls_of(CallKind::Json).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exact_duplicates_dispatch_once() {
    let transport = ScriptedTransport::new().build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator
        .run(
            "https://fresheropenings.com/a again https://fresheropenings.com/a and https://fresheropenings.com/a/",
            date(),
        )
        .await;

    // Trailing-slash variant stays a separate item by default
    assert_eq!(report.dispatch.len(), 2);
    assert_eq!(transport.calls_of(CallKind::Form).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_merge_equivalent_policy() {
    let transport = ScriptedTransport::new().build();
    let mut config = test_config(GateMode::PerEndpoint);
    config.dispatch.duplicate_policy = DuplicatePolicy::MergeEquivalent;
    let orchestrator = Orchestrator::new(config, transport.clone()).unwrap();

    let report = orchestrator
        .run(
            "https://fresheropenings.com/a and https://fresheropenings.com/a/",
            date(),
        )
        .await;

    assert_eq!(report.dispatch.len(), 1);
    assert_eq!(report.dispatch[0].item.source_url, "https://fresheropenings.com/a");
}

#[tokio::test(start_paused = true)]
async fn test_match_strategies() {
    let text = "https://unknown.example/fresheropenings.com";

    let transport = ScriptedTransport::new().build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();
    let report = orchestrator.run(text, date()).await;
    assert_eq!(report.dispatch[0].status, DispatchStatus::Success);

    let mut config = test_config(GateMode::PerEndpoint);
    config.dispatch.match_strategy = MatchStrategy::Host;
    let orchestrator = Orchestrator::new(config, ScriptedTransport::new().build()).unwrap();
    let report = orchestrator.run(text, date()).await;
    assert_eq!(report.dispatch[0].status, DispatchStatus::Unrouted);
}

#[tokio::test(start_paused = true)]
async fn test_ping() {
    let transport = ScriptedTransport::new()
        .probe(SCRAPER_3, vec![Ok(503)])
        .probe(SCRAPER_1, vec![Err(TransportError::connect("connection refused"))])
        .build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator.ping("notifications").await.unwrap();
    assert_eq!(report.status, ServiceStatus::Active);
    assert_eq!(report.address, NOTIFY);

    let report = orchestrator.ping("fresherscamp.com").await.unwrap();
    assert_eq!(report.status, ServiceStatus::Starting);

    let report = orchestrator.ping("fresheropenings.com").await.unwrap();
    assert_eq!(report.status, ServiceStatus::Offline);
    assert_eq!(report.detail, "connection refused");

    // A ping never retries
    assert_eq!(transport.probes_to(SCRAPER_3), 1);

    let err = orchestrator.ping("nope.example").await.unwrap_err();
    assert!(matches!(err, Error::UnknownService(name) if name == "nope.example"));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = test_config(GateMode::PerEndpoint);
    config.endpoints.clear();

    let result = Orchestrator::new(config, ScriptedTransport::new().build());
    assert!(matches!(result, Err(Error::Config(_))));
}
