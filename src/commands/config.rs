use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::MakeWriter;

use fanout::config::Config;

/// File (if given) plus `FANOUT_*` overrides, validated
///
/// Runs before the global subscriber exists, so warnings about ignored
/// environment values go to stderr through a scoped one.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    load_config_logging_to(path, std::io::stderr)
}

fn load_config_logging_to<W>(path: Option<&Path>, writer: W) -> Result<Config>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();

    let config = tracing::subscriber::with_default(subscriber, || Config::load(path))
        .with_context(|| match path {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to load configuration".to_string(),
        })?;
    Ok(config)
}

/// Print the effective configuration as TOML
pub fn show_config(config: &Config) -> Result<()> {
    let rendered = config.to_toml().context("Failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
