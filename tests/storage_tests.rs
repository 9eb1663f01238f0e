// tests/storage_tests.rs

use promo_counters::config::StoreConfig;
use promo_counters::storage::{build_store, CounterStore, InMemoryStore};
use secrecy::Secret;
use std::time::Duration;

#[tokio::test]
async fn memory_store_basic_operations() {
    let store = InMemoryStore::new();

    assert_eq!(store.incr("wins").await.unwrap(), 1);
    assert_eq!(store.incr("wins").await.unwrap(), 2);
    store.set("losses", "0").await.unwrap();
    assert_eq!(store.get("losses").await.unwrap().as_deref(), Some("0"));
    assert!(store.expire("wins", Duration::from_secs(60)).await.unwrap());
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn memory_stores_are_isolated() {
    let first = InMemoryStore::new();
    let second = InMemoryStore::new();

    first.incr("shared-name").await.unwrap();
    assert_eq!(second.get("shared-name").await.unwrap(), None);
}

#[tokio::test]
async fn set_clears_a_previous_ttl() {
    let store = InMemoryStore::new();
    store.set("k", "1").await.unwrap();
    store.expire("k", Duration::ZERO).await.unwrap();
    store.set("k", "2").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("2"));
}

#[test]
fn no_backend_settings_fall_back_to_memory() {
    let store = build_store(&StoreConfig::default()).unwrap();
    assert_eq!(store.backend_name(), "memory");
}

#[test]
fn rest_settings_select_the_rest_store() {
    let config = StoreConfig {
        rest_url: Some("https://kv.example.com".to_string()),
        rest_token: Some(Secret::new("token".to_string())),
        redis_url: Some("redis://localhost:6379".to_string()),
        ..StoreConfig::default()
    };
    assert_eq!(build_store(&config).unwrap().backend_name(), "rest");
}

#[cfg(feature = "redis")]
#[tokio::test]
async fn redis_url_selects_the_redis_store() {
    // Pool creation is lazy; no server is contacted here.
    let config = StoreConfig {
        redis_url: Some("redis://localhost:6379/15".to_string()),
        ..StoreConfig::default()
    };
    assert_eq!(build_store(&config).unwrap().backend_name(), "redis");
}
