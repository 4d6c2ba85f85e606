//! CLI argument definitions for logalyzer-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use logalyzer_core::config::LogalyzerConfig;

/// Web access-log collector and dashboard server.
///
/// Tails the configured access logs on a dedicated thread and serves
/// the configured dashboards over HTTP.
#[derive(Parser, Debug)]
#[command(name = "logalyzer-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logalyzer.toml configuration file.
    #[arg(short, long, default_value = "/etc/logalyzer/logalyzer.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut LogalyzerConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}
