use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::io::{AsyncRead, AsyncReadExt};

use fanout::config::Config;
use fanout::orchestrator::Orchestrator;

/// One run; the JSON report goes to stdout
pub async fn run(
    config: Config,
    text: Option<String>,
    file: Option<PathBuf>,
    date: Option<String>,
    pretty: bool,
) -> Result<()> {
    let text = read_input(text, file, tokio::io::stdin()).await?;

    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {raw}. Expected YYYY-MM-DD"))?,
        None => chrono::Local::now().date_naive(),
    };

    let orchestrator =
        Orchestrator::from_config(config).context("Failed to create orchestrator")?;
    let report = orchestrator.run(&text, date).await;

    let rendered = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{rendered}");

    let summary = report.summary();
    eprintln!(
        "{} URLs: {} dispatched, {} failed, {} unrouted; {}/{} services ready; notification {}",
        summary.items_total,
        summary.succeeded,
        summary.failed,
        summary.unrouted,
        summary.endpoints_ready,
        summary.endpoints_total,
        if summary.notification_sent { "sent" } else { "failed" }
    );

    Ok(())
}

/// `--text`, else `--file`, else everything on `stdin`; empty text is a valid run
async fn read_input<R>(text: Option<String>, file: Option<PathBuf>, mut stdin: R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    if let Some(text) = text {
        return Ok(text);
    }

    if let Some(path) = file {
        return tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .await
        .context("Failed to read text from stdin")?;
    Ok(buffer)
}
