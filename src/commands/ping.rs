use anyhow::{Context, Result};

use fanout::config::Config;
use fanout::models::ServiceStatus;
use fanout::orchestrator::Orchestrator;

pub async fn ping(config: Config, service: String) -> Result<()> {
    let orchestrator =
        Orchestrator::from_config(config).context("Failed to create orchestrator")?;

    let report = orchestrator
        .ping(&service)
        .await
        .with_context(|| format!("Cannot ping '{service}'"))?;

    println!("{}: {} ({})", report.service, report.status.as_str(), report.detail);
    println!("  Address: {}", report.address);

    if report.status == ServiceStatus::Offline {
        tracing::warn!(service = %report.service, "Service is offline");
    }
    Ok(())
}
