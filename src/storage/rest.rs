// src/storage/rest.rs

use crate::config::StoreConfig;
use crate::error::{AppError, Result};
use crate::storage::CounterStore;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Serialize)]
struct CommandRequest<'a> {
    command: &'a [&'a str],
}

#[derive(Deserialize, Debug)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Upstash-compatible Redis-over-HTTP store.
///
/// Each command is a single authenticated `POST` of `{"command": [...]}`.
pub struct RestStore {
    client: Client,
    url: String,
    token: Secret<String>,
}

impl RestStore {
    pub fn new(url: impl Into<String>, token: Secret<String>, config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }

    async fn command(&self, command: &[&str]) -> Result<Value> {
        let name = command.first().copied().unwrap_or_default();
        trace!(command = name, "RestStore: sending command");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.token.expose_secret())
            .json(&CommandRequest { command })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Upstash explains rejected commands in an `error` field; keep it when present.
            let detail = response
                .json::<CommandReply>()
                .await
                .ok()
                .and_then(|reply| reply.error);
            debug!(command = name, status = status.as_u16(), "RestStore: command rejected");
            return Err(AppError::storage(
                name,
                match detail {
                    Some(detail) => format!("Upstash error: {} ({detail})", status.as_u16()),
                    None => format!("Upstash error: {}", status.as_u16()),
                },
            ));
        }

        let reply: CommandReply = response.json().await?;
        if let Some(error) = reply.error {
            return Err(AppError::storage(name, error));
        }
        Ok(reply.result)
    }
}

fn value_to_string(operation: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(AppError::storage(
            operation,
            format!("unexpected result: {other}"),
        )),
    }
}

fn value_to_i64(operation: &str, value: Value) -> Result<i64> {
    let parsed = match &value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::storage(operation, format!("expected integer, got {value}")))
}

#[async_trait]
impl CounterStore for RestStore {
    fn backend_name(&self) -> &'static str {
        "rest"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let result = self.command(&["GET", key]).await?;
        value_to_string("GET", result)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.command(&["SET", key, value]).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let result = self.command(&["INCR", key]).await?;
        value_to_i64("INCR", result)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let secs = ttl.as_secs().to_string();
        let result = self.command(&["EXPIRE", key, secs.as_str()]).await?;
        Ok(value_to_i64("EXPIRE", result)? == 1)
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        let result = self.command(&["GETDEL", key]).await?;
        value_to_string("GETDEL", result)
    }
}
