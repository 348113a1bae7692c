use anyhow::{Context, Result};

use fanout::config::Config;
use fanout::orchestrator::Orchestrator;
use fanout::server::ApiServer;

pub async fn serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {bind}"))?;
    }
    let server_config = config.server.clone();

    println!("Starting fanout server");
    println!("======================");
    println!("  Bind Address: {}", server_config.bind_address);
    println!("  Gate: {}", config.dispatch.gate.as_str());
    println!("  Concurrency: {}", config.dispatch.concurrency);
    println!("  Notification: {}", config.notification.address);
    for endpoint in &config.endpoints {
        println!("  Endpoint: {} -> {}", endpoint.keyword, endpoint.address);
    }
    println!(
        "  CORS: {}",
        if server_config.enable_cors { "enabled" } else { "disabled" }
    );
    println!();
    println!("API Endpoints:");
    println!("  POST /api/run          - Run for JSON {{\"text\": ...}}");
    println!("  POST /                 - Run for form field text");
    println!("  GET  /ping/{{service}}   - Single status probe");
    println!("  GET  /health           - Health check");
    println!();
    println!("Press Ctrl+C to stop.\n");

    let orchestrator =
        Orchestrator::from_config(config).context("Failed to create orchestrator")?;
    let server = ApiServer::new(orchestrator, server_config);

    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("fanout server stopped.");
    Ok(())
}
