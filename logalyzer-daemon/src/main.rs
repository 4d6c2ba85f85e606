use anyhow::Result;
use clap::Parser;

use logalyzer_core::config::LogalyzerConfig;
use logalyzer_daemon::cli::DaemonCli;
use logalyzer_daemon::logging::init_tracing;
use logalyzer_daemon::orchestrator::{Orchestrator, validate_config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let mut config = LogalyzerConfig::load(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {e}", cli.config.display()))?;
    cli.apply_overrides(&mut config);

    if cli.validate {
        validate_config(&config)?;
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "logalyzer-daemon starting"
    );

    let orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("logalyzer-daemon shut down");
    Ok(())
}
