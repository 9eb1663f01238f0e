// src/config/loader.rs

use crate::config::{AppConfig, ConfigValidator};
use crate::error::{AppError, Result};
use secrecy::Secret;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from an optional YAML file, then apply environment overrides.
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    let mut config = if config_path.exists() {
        info!("Loading configuration from file: {}", config_path.display());
        load_from_file(config_path)?
    } else {
        info!("Configuration file not found, using defaults");
        AppConfig::default()
    };

    override_with_env(&mut config);

    ConfigValidator::validate(&config)?;

    debug!("Configuration loaded and validated successfully");
    Ok(config)
}

fn load_from_file(config_path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)?;
    if content.trim().is_empty() {
        warn!("Config file '{}' is empty. Using defaults.", config_path.display());
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!(
            "Failed to parse config file '{}': {e}",
            config_path.display()
        ))
    })
}

/// Reads a variable, treating an empty or whitespace-only value as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn override_with_env(config: &mut AppConfig) {
    // Vercel KV exposes the same REST API under its own variable names.
    if let Some(url) = env_var("UPSTASH_REDIS_REST_URL").or_else(|| env_var("KV_REST_API_URL")) {
        info!("Overriding REST store URL from environment variable");
        config.store.rest_url = Some(url);
    }

    if let Some(token) =
        env_var("UPSTASH_REDIS_REST_TOKEN").or_else(|| env_var("KV_REST_API_TOKEN"))
    {
        info!("Overriding REST store token from environment variable");
        config.store.rest_token = Some(Secret::new(token));
    }

    if let Some(redis_url) = env_var("REDIS_URL") {
        info!("Overriding Redis URL from environment variable");
        config.store.redis_url = Some(redis_url);
    }

    if let Some(host) = env_var("PROMO_COUNTERS_HOST") {
        info!("Overriding server host from environment variable: {}", host);
        config.server.host = host;
    }

    if let Some(port_str) = env_var("PORT") {
        if let Ok(port) = port_str.parse::<u16>() {
            info!("Overriding server port from environment variable: {}", port);
            config.server.port = port;
        } else {
            warn!("Invalid PORT environment variable: {}", port_str);
        }
    }
}
