//! Prometheus metrics exporter.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`;
//! the dashboard server does not serve `/metrics` itself.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Result;
use logalyzer_core::config::MetricsConfig;
use logalyzer_core::metrics as m;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tokio::sync::broadcast;

/// Histograms recorded in seconds.
const DURATION_HISTOGRAMS: [&str; 2] = [
    m::LOG_PIPELINE_TICK_DURATION_SECONDS,
    m::DASHBOARD_REQUEST_DURATION_SECONDS,
];

/// Resolve the exporter listen address from the configuration.
///
/// Only the `/metrics` scrape path is served by the built-in listener.
pub fn listen_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    if config.endpoint != "/metrics" {
        return Err(anyhow::anyhow!(
            "unsupported metrics endpoint '{}': only '/metrics' is supported",
            config.endpoint
        ));
    }
    let addr: SocketAddr = format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {e}"))?;
    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces"
        );
    }
    Ok(addr)
}

/// Install the global metrics recorder and start the HTTP listener.
///
/// Call at most once per process, before the collector starts.
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    let addr = listen_addr(config)?;

    let mut builder = PrometheusBuilder::new().with_http_listener(addr);
    for name in DURATION_HISTOGRAMS {
        builder = builder
            .set_buckets_for_metric(Matcher::Full(name.to_owned()), &m::DURATION_BUCKETS)
            .map_err(|e| anyhow::anyhow!("invalid histogram buckets for {name}: {e}"))?;
    }
    builder
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {e}"))?;

    m::describe_all();
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");
    Ok(())
}

/// Spawn a task that refreshes the uptime gauge every 10 seconds.
pub fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(10));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS)
                        .set(start_time.elapsed().as_secs_f64());
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
