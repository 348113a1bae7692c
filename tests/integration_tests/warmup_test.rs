//! Warm-up retry behavior as seen through a full run

use chrono::NaiveDate;

use fanout::dispatch::GateMode;
use fanout::models::{DispatchStatus, ProbeOutcome, WarmupState};
use fanout::orchestrator::Orchestrator;
use fanout::transport::TransportError;

use crate::common::{test_config, CallKind, ScriptedTransport, SCRAPER_1, SCRAPER_2};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

fn delays(report: &fanout::RunReport, index: usize) -> Vec<Option<u64>> {
    report.warmup[index]
        .attempts
        .iter()
        .map(|attempt| attempt.backoff_delay_ms)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_always_503_exhausts_with_doubling_delays() {
    let transport = ScriptedTransport::new()
        .probe(SCRAPER_1, vec![Ok(503)])
        .submit(SCRAPER_1, Ok(503))
        .build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator
        .run("https://fresheropenings.com/job/1", date())
        .await;

    let warmup = &report.warmup[0];
    assert_eq!(warmup.final_state, WarmupState::Exhausted);
    assert_eq!(warmup.attempts.len(), 5);
    assert_eq!(
        delays(&report, 0),
        vec![Some(3000), Some(6000), Some(12000), Some(24000), None]
    );
    assert_eq!(transport.probes_to(SCRAPER_1), 5);

    // Warm-up is advisory: dispatch is still attempted
    assert_eq!(
        report.dispatch[0].status,
        DispatchStatus::RemoteFailure { code: 503 }
    );
}

#[tokio::test(start_paused = true)]
async fn test_404_is_permanent_after_one_attempt() {
    let transport = ScriptedTransport::new()
        .probe(SCRAPER_2, vec![Ok(404)])
        .build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator.run("", date()).await;

    let warmup = &report.warmup[1];
    assert_eq!(warmup.final_state, WarmupState::PermanentFailure);
    assert_eq!(warmup.attempts.len(), 1);
    assert_eq!(
        warmup.attempts[0].outcome,
        ProbeOutcome::PermanentFailure { status: 404 }
    );
    assert_eq!(transport.probes_to(SCRAPER_2), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_errors_are_retried() {
    let transport = ScriptedTransport::new()
        .probe(
            SCRAPER_1,
            vec![
                Err(TransportError::connect("connection refused")),
                Err(TransportError::timeout("operation timed out")),
                Ok(200),
            ],
        )
        .build();
    let orchestrator =
        Orchestrator::new(test_config(GateMode::PerEndpoint), transport.clone()).unwrap();

    let report = orchestrator.run("", date()).await;

    let warmup = &report.warmup[0];
    assert_eq!(warmup.final_state, WarmupState::Ready);
    assert_eq!(warmup.attempts.len(), 3);
    assert!(!warmup.was_ready_immediately());
    assert_eq!(delays(&report, 0), vec![Some(3000), Some(6000), None]);
}

#[tokio::test(start_paused = true)]
async fn test_delay_cap() {
    let transport = ScriptedTransport::new()
        .probe(SCRAPER_1, vec![Ok(502)])
        .build();
    let mut config = test_config(GateMode::PerEndpoint);
    config.warmup.max_delay_ms = Some(5_000);
    let orchestrator = Orchestrator::new(config, transport).unwrap();

    let report = orchestrator.run("", date()).await;

    assert_eq!(
        delays(&report, 0),
        vec![Some(3000), Some(5000), Some(5000), Some(5000), None]
    );
}

#[tokio::test(start_paused = true)]
async fn test_deadline_ends_warmup_early() {
    let transport = ScriptedTransport::new()
        .probe(SCRAPER_1, vec![Ok(503)])
        .build();
    let mut config = test_config(GateMode::PerEndpoint);
    config.warmup.deadline_secs = Some(30);
    let orchestrator = Orchestrator::new(config, transport.clone()).unwrap();

    let report = orchestrator
        .run("https://fresheropenings.com/job/1", date())
        .await;

    let warmup = &report.warmup[0];
    assert_eq!(warmup.final_state, WarmupState::Exhausted);
    assert_eq!(warmup.attempts.len(), 3);
    assert!(warmup.message.contains("deadline"));

    // Dispatch follows as soon as the shortened warm-up ends
    let form = &transport.calls_of(CallKind::Form)[0];
    assert!(form.at < std::time::Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_single_retry_budget() {
    let transport = ScriptedTransport::new()
        .probe(SCRAPER_1, vec![Ok(503)])
        .build();
    let mut config = test_config(GateMode::PerEndpoint);
    config.warmup.max_retries = 1;
    let orchestrator = Orchestrator::new(config, transport.clone()).unwrap();

    let report = orchestrator.run("", date()).await;

    assert_eq!(report.warmup[0].final_state, WarmupState::Exhausted);
    assert_eq!(delays(&report, 0), vec![None]);
    assert_eq!(transport.probes_to(SCRAPER_1), 1);
}
