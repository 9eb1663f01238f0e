//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::NaiveDate;
use promo_counters::{
    create_router,
    error::{AppError, Result},
    promotion::{FixedClock, PromotionPolicy, PromotionService},
    storage::{CounterStore, InMemoryStore},
    AppState,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Monday, 15 January 2024.
pub const MONDAY: &str = "2024-1-15";
/// Wednesday, 17 January 2024. The pacing draw for this day is below the ratio.
pub const WEDNESDAY: &str = "2024-1-17";
/// Thursday, 18 January 2024. The pacing draw for this day is above the ratio.
pub const THURSDAY: &str = "2024-1-18";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Clock pinned to Monday, 15 January 2024.
pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(date(2024, 1, 15)))
}

pub fn service_with_store(store: Arc<dyn CounterStore>) -> PromotionService {
    PromotionService::new(store, test_clock(), PromotionPolicy::default())
}

/// A fresh in-memory service plus a handle on its store.
pub fn memory_service() -> (PromotionService, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    (service_with_store(store.clone()), store)
}

pub fn test_server_for(service: PromotionService) -> TestServer {
    let state = Arc::new(AppState::new(service));
    TestServer::new(create_router(state)).unwrap()
}

pub fn test_server() -> (TestServer, Arc<InMemoryStore>) {
    let (service, store) = memory_service();
    (test_server_for(service), store)
}

/// A store whose every call fails, as if the backend were unreachable.
#[derive(Debug, Default)]
pub struct UnavailableStore {
    pub calls: AtomicUsize,
}

impl UnavailableStore {
    fn fail<T>(&self, operation: &str) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::storage(operation, "connection refused"))
    }
}

#[async_trait]
impl CounterStore for UnavailableStore {
    fn backend_name(&self) -> &'static str {
        "unavailable"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.fail("GET")
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        self.fail("SET")
    }

    async fn incr(&self, _key: &str) -> Result<i64> {
        self.fail("INCR")
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
        self.fail("EXPIRE")
    }

    async fn get_del(&self, _key: &str) -> Result<Option<String>> {
        self.fail("GETDEL")
    }
}

/// Wraps a store and answers reads of keys containing `stale_marker` with a
/// fixed value, standing in for a concurrent caller that read before us.
pub struct StaleReadStore {
    pub inner: Arc<InMemoryStore>,
    pub stale_marker: String,
    pub stale_value: String,
}

#[async_trait]
impl CounterStore for StaleReadStore {
    fn backend_name(&self) -> &'static str {
        "stale"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        if key.contains(&self.stale_marker) {
            return Ok(Some(self.stale_value.clone()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.inner.incr(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.inner.expire(key, ttl).await
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_del(key).await
    }
}

/// Fails only `EXPIRE`, so writes land but the retention refresh does not.
pub struct ExpireFailsStore {
    pub inner: Arc<InMemoryStore>,
}

#[async_trait]
impl CounterStore for ExpireFailsStore {
    fn backend_name(&self) -> &'static str {
        "expire-fails"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.inner.incr(key).await
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
        Err(AppError::storage("EXPIRE", "timeout"))
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_del(key).await
    }
}
