// src/storage/memory.rs

use crate::error::{AppError, Result};
use crate::storage::CounterStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::trace;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Process-local counter table.
///
/// Used when no backend is configured. Nothing is shared across processes
/// or survives a restart. Reads skip expired entries; writes sweep them out,
/// so keys for past days do not pile up in a long-running process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

fn prune_expired(entries: &mut HashMap<String, Entry>, now: Instant) {
    let before = entries.len();
    entries.retain(|_, e| e.is_live(now));
    let pruned = before - entries.len();
    if pruned > 0 {
        trace!(pruned, "InMemoryStore: dropped expired entries");
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys. Test helper.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CounterStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        trace!("InMemoryStore::get: waiting for read lock");
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        trace!("InMemoryStore::set: waiting for write lock");
        let mut entries = self.entries.write().await;
        prune_expired(&mut entries, Instant::now());
        // Plain SET clears any TTL, as in Redis.
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        trace!("InMemoryStore::incr: waiting for write lock");
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        prune_expired(&mut entries, now);
        let live = entries.get(key).cloned();

        let (current, expires_at) = match live {
            Some(entry) => {
                let current = entry.value.trim().parse::<i64>().map_err(|_| {
                    AppError::storage("INCR", format!("value at '{key}' is not an integer"))
                })?;
                (current, entry.expires_at)
            }
            None => (0, None),
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| AppError::storage("INCR", "increment would overflow"))?;
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        prune_expired(&mut entries, now);
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_del(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        Ok(entries
            .remove(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value))
    }
}
