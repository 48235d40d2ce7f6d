//! Per-user cache of property listings.
//!
//! Entries live until their TTL runs out or a write to a property forgets
//! them. Values are the already-rendered JSON listing.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

#[async_trait]
pub trait PropertyCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    async fn put(&self, key: &str, value: Value, ttl: Duration);

    async fn forget(&self, key: &str);
}

/// Cache key for a user's property listing
pub fn listing_key(user_id: i64) -> String {
    format!("properties_{}", user_id)
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-process cache with lazy expiry on read
#[derive(Default)]
pub struct TtlCache {
    map: DashMap<String, Entry>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entries only
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.map.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PropertyCache for TtlCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let entry = self.map.get(key)?;
        if entry.is_expired(now) {
            drop(entry);
            self.map.remove_if(key, |_, e| e.is_expired(now));
            return None;
        }
        Some(entry.value.clone())
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.map.insert(key.to_string(), entry);
    }

    async fn forget(&self, key: &str) {
        if self.map.remove(key).is_some() {
            tracing::debug!(key, "Property cache entry forgotten");
        }
    }
}

/// Cache that never stores anything
pub struct NoopCache;

#[async_trait]
impl PropertyCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn put(&self, _key: &str, _value: Value, _ttl: Duration) {}

    async fn forget(&self, _key: &str) {}
}
