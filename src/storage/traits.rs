// src/storage/traits.rs

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// The handful of key-value primitives the promotion counters are built on.
///
/// Values are strings on the wire; counters are decimal integers. Every
/// method is a single round trip to the backend.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Short backend identifier for logs and the health endpoint.
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Increment by one, treating a missing key as `0`. Returns the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Set a time-to-live. Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Read and delete in one atomic step.
    async fn get_del(&self, key: &str) -> Result<Option<String>>;
}

impl std::fmt::Debug for dyn CounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CounterStore({})", self.backend_name())
    }
}
