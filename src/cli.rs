// src/cli.rs

use crate::config::{load_config, AppConfig, ConfigValidator};
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "promo-counters",
    version,
    about = "Daily win/loss counters and prize pacing for the café wheel promotion"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "PROMO_COUNTERS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log filter used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Emit JSON logs
    #[arg(long, env = "PROMO_COUNTERS_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Load and validate configuration, then print the effective settings
    CheckConfig,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from("config.yaml"))
    }

    /// File, then environment, then command-line flags.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = load_config(&self.config_path())?;
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}

/// Human-readable summary of the effective configuration. Secrets are never printed.
pub fn describe_config(config: &AppConfig) -> String {
    let backend = if config.store.rest_url.is_some() {
        "rest"
    } else if config.store.redis_url.is_some() {
        "redis"
    } else {
        "memory"
    };
    let limits = config
        .promotion
        .monthly_limits
        .iter()
        .map(|(id, limit)| format!("{id}={limit}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "listen: {}:{}\nbackend: {}\nloss streak threshold: {}\nmonthly limits: {}\nretention: {}s daily, {}s monthly",
        config.server.host,
        config.server.port,
        backend,
        config.promotion.loss_streak_threshold,
        if limits.is_empty() { "none".to_string() } else { limits },
        config.promotion.daily_ttl_secs,
        config.promotion.monthly_ttl_secs,
    )
}
