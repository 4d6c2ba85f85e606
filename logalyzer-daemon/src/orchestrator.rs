//! Component assembly and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `logalyzer-daemon`.
//! It validates configuration, builds the dataset, enricher registry,
//! collector and dashboards, then runs the collector thread next to the
//! HTTP server until a shutdown signal arrives.
//!
//! # Startup Order
//!
//! 1. Metrics recorder (if enabled)
//! 2. Collector thread (writer)
//! 3. Dashboard HTTP server (readers)
//!
//! # Shutdown Order
//!
//! 1. HTTP server stops accepting and drains in-flight requests
//! 2. Collector thread finishes its current tick and exits

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use logalyzer_core::LogalyzerError;
use logalyzer_core::config::LogalyzerConfig;
use logalyzer_dashboard::{DashboardState, Dashboards};
use logalyzer_log_pipeline::{
    AccessLogParser, Collector, Dataset, LogPipelineBuilder, PipelineConfig, builtin_registry,
    spawn_collector,
};

use crate::metrics_server;

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: LogalyzerConfig,
    /// Shared record store (one writer, many readers).
    dataset: Arc<Dataset>,
    /// Prepared dashboard views.
    dashboards: Arc<Dashboards>,
    /// Collector waiting to be moved onto its thread.
    collector: Collector,
    /// Pause between collector ticks.
    poll_interval: Duration,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

/// Check everything that would make startup fail, without starting anything.
///
/// Covers the core configuration, the collector settings, the line template
/// and the dashboard definitions.
pub fn validate_config(config: &LogalyzerConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {e}"))?;
    let pipeline_config = PipelineConfig::from_core(&config.collector)
        .map_err(|e| anyhow::anyhow!("invalid collector config: {}", LogalyzerError::from(e)))?;
    AccessLogParser::new(&pipeline_config.line_format, &pipeline_config.datetime_format)
        .map_err(|e| anyhow::anyhow!("invalid line format: {e}"))?;
    Dashboards::from_config(&config.dashboards, &config.server)
        .map_err(|e| anyhow::anyhow!("invalid dashboards: {e}"))?;
    Ok(())
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or parsed
    /// - Configuration validation fails
    /// - The log path does not exist
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = LogalyzerConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    pub async fn build_from_config(config: LogalyzerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {e}"))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let dashboards = Dashboards::from_config(&config.dashboards, &config.server)
            .map_err(|e| anyhow::anyhow!("invalid dashboards: {e}"))?;

        let pipeline_config = PipelineConfig::from_core(&config.collector)
            .map_err(|e| anyhow::anyhow!("invalid collector config: {}", LogalyzerError::from(e)))?;
        let dataset = Arc::new(Dataset::new(pipeline_config.snapshot_lock_timeout));

        let mut registry = builtin_registry();
        let loaded = registry.load(&config.enrichers);
        tracing::info!(
            loaded,
            configured = config.enrichers.plugins.len(),
            "enrichers loaded"
        );

        let pipeline = LogPipelineBuilder::new()
            .config(pipeline_config.clone())
            .dataset(Arc::clone(&dataset))
            .registry(registry)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build log pipeline: {e}"))?;
        let collector = Collector::new(&pipeline_config, pipeline)
            .map_err(|e| anyhow::anyhow!("failed to build collector: {}", LogalyzerError::from(e)))?;

        tracing::info!(
            log_path = %pipeline_config.log_path.display(),
            dashboards = dashboards.len(),
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            dataset,
            dashboards: Arc::new(dashboards),
            collector,
            poll_interval: pipeline_config.poll_interval,
            start_time: Instant::now(),
        })
    }

    /// Bind the dashboard listener configured in `[server]`.
    pub async fn bind(&self) -> Result<TcpListener> {
        logalyzer_dashboard::bind(&self.config.server.host, self.config.server.port)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))
    }

    /// Run until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.run_until(listener, async {
            match wait_for_shutdown_signal().await {
                Ok(signal) => tracing::info!(signal, "shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "signal handling failed, shutting down"),
            }
        })
        .await
    }

    /// Start the collector thread, serve dashboards on `listener` until
    /// `shutdown` completes, then stop and join the collector.
    pub async fn run_until(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let Self {
            config,
            dataset,
            dashboards,
            collector,
            poll_interval,
            start_time,
        } = self;

        let handle = spawn_collector(collector, poll_interval)
            .map_err(|e| anyhow::anyhow!("failed to start collector: {e}"))?;

        let (shutdown_tx, _) = broadcast::channel(1);
        let uptime_task = config
            .metrics
            .enabled
            .then(|| metrics_server::spawn_uptime_updater(start_time, shutdown_tx.subscribe()));

        let state = DashboardState::new(dashboards, dataset);
        let notify = shutdown_tx.clone();
        let served = logalyzer_dashboard::serve(listener, state, async move {
            shutdown.await;
            let _ = notify.send(());
        })
        .await;

        let _ = shutdown_tx.send(());
        if let Some(task) = uptime_task {
            let _ = task.await;
        }

        tracing::info!("stopping collector");
        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(collector)) => {
                tracing::info!(files = collector.cursor().len(), "collector stopped");
            }
            Ok(Err(e)) => tracing::error!(error = %e, "collector did not stop cleanly"),
            Err(e) => tracing::error!(error = %e, "collector join task failed"),
        }

        served.map_err(|e| anyhow::anyhow!("dashboard server failed: {e}"))
    }

    /// Shared dataset handle.
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Loaded configuration.
    pub fn config(&self) -> &LogalyzerConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {e}"))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {e}"))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
