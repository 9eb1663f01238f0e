// src/config/validation.rs

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use tracing::{debug, warn};
use url::Url;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> Result<()> {
        debug!("Starting configuration validation");

        if let Err(e) = Self::validate_server_config(config) {
            warn!("Server config validation failed: {}", e);
            return Err(e);
        }

        if let Err(e) = Self::validate_store_config(config) {
            warn!("Store config validation failed: {}", e);
            return Err(e);
        }

        if let Err(e) = Self::validate_promotion_config(config) {
            warn!("Promotion config validation failed: {}", e);
            return Err(e);
        }

        debug!("Configuration validation completed successfully");
        Ok(())
    }

    fn validate_server_config(config: &AppConfig) -> Result<()> {
        if config.server.host.trim().is_empty() {
            return Err(AppError::Config("server.host cannot be empty".to_string()));
        }
        if config.server.port == 0 {
            return Err(AppError::Config("server.port cannot be 0".to_string()));
        }
        if config.server.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "server.request_timeout_secs cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_store_config(config: &AppConfig) -> Result<()> {
        let store = &config.store;

        // Half a REST configuration is almost certainly a deployment mistake.
        if store.rest_url.is_some() != store.rest_token.is_some() {
            return Err(AppError::Config(
                "store.rest_url and store.rest_token must be set together".to_string(),
            ));
        }
        if let Some(rest_url) = &store.rest_url {
            Self::validate_url(rest_url, "store.rest_url")?;
        }
        if let Some(redis_url) = &store.redis_url {
            Self::validate_url(redis_url, "store.redis_url")?;
        }
        if store.connect_timeout_secs == 0 || store.request_timeout_secs == 0 {
            return Err(AppError::Config("store timeouts cannot be 0".to_string()));
        }
        Ok(())
    }

    fn validate_promotion_config(config: &AppConfig) -> Result<()> {
        let promotion = &config.promotion;

        if promotion.loss_streak_threshold < 1 {
            return Err(AppError::Config(
                "promotion.loss_streak_threshold must be at least 1".to_string(),
            ));
        }
        if promotion.daily_ttl_secs == 0 || promotion.monthly_ttl_secs == 0 {
            return Err(AppError::Config(
                "promotion retention windows cannot be 0".to_string(),
            ));
        }
        if let Some(id) = promotion.monthly_limits.keys().find(|id| id.trim().is_empty()) {
            return Err(AppError::Config(format!(
                "promotion.monthly_limits contains an empty prize id: '{id}'"
            )));
        }
        Ok(())
    }

    fn validate_url(url_str: &str, field_name: &str) -> Result<()> {
        Url::parse(url_str).map_err(|e| {
            AppError::Config(format!("Invalid URL in {field_name}: {url_str} - {e}"))
        })?;
        Ok(())
    }
}
