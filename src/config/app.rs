// src/config/app.rs

use secrecy::Secret;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const DAY_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Where counters live. With neither REST nor Redis settings the service
/// falls back to a process-local table.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Upstash-compatible REST endpoint, from `UPSTASH_REDIS_REST_URL`.
    #[serde(default)]
    pub rest_url: Option<String>,
    /// Bearer token for `rest_url`, from `UPSTASH_REDIS_REST_TOKEN`.
    #[serde(default)]
    pub rest_token: Option<Secret<String>>,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub redis_key_prefix: Option<String>,
    #[serde(default = "default_store_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_store_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            rest_url: None,
            rest_token: None,
            redis_url: None,
            redis_key_prefix: None,
            connect_timeout_secs: default_store_connect_timeout(),
            request_timeout_secs: default_store_request_timeout(),
        }
    }
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromotionConfig {
    /// Prize id -> awards allowed per calendar month.
    #[serde(default = "default_monthly_limits")]
    pub monthly_limits: BTreeMap<String, u32>,
    /// Consecutive losses after which the next spin is forced to win.
    #[serde(default = "default_loss_streak_threshold")]
    pub loss_streak_threshold: i64,
    #[serde(default = "default_daily_ttl")]
    pub daily_ttl_secs: u64,
    #[serde(default = "default_monthly_ttl")]
    pub monthly_ttl_secs: u64,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            monthly_limits: default_monthly_limits(),
            loss_streak_threshold: default_loss_streak_threshold(),
            daily_ttl_secs: default_daily_ttl(),
            monthly_ttl_secs: default_monthly_ttl(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub promotion: PromotionConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_store_connect_timeout() -> u64 {
    5
}

fn default_store_request_timeout() -> u64 {
    10
}

fn default_monthly_limits() -> BTreeMap<String, u32> {
    BTreeMap::from([("OFF10".to_string(), 9)])
}

fn default_loss_streak_threshold() -> i64 {
    10
}

fn default_daily_ttl() -> u64 {
    7 * DAY_SECS
}

fn default_monthly_ttl() -> u64 {
    40 * DAY_SECS
}
