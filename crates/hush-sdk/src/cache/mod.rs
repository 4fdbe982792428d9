// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! Stale-while-revalidate JSON cache.
//!
//! Every cached document is `{"data": .., "lastCachedAt": <unix ms>}`.
//! Reads return stale data with `is_stale` set instead of blocking on a
//! refresh; the caller decides whether to revalidate.
//!
//! The cache never fails an authoritative action: store errors are logged
//! and surface as [`CacheResult::Unavailable`] on reads and [`CacheError`]
//! on writes, which callers are free to ignore.
//!
//! ```rust
//! use hush_sdk::cache::{Cache, CacheResult, MemoryStore};
//!
//! # async fn example() {
//! let cache = Cache::new(MemoryStore::new());
//! let _ = cache.put("group_1", &serde_json::json!({"name": "rust"})).await;
//! match cache.get("group_1").await {
//!     CacheResult::Hit(entry) => assert!(!entry.is_stale),
//!     other => panic!("{other:?}"),
//! }
//! # }
//! ```

pub mod keys;
mod memory;
pub mod path;
mod upstash;

use std::future::Future;
use std::time::Duration;

use serde_json::{json, Value};

pub use memory::MemoryStore;
pub use upstash::UpstashStore;

use crate::config::DEFAULT_CACHE_TTL_SECS;

/// RedisJSON command surface. Paths follow [`path`] syntax.
pub trait JsonStore {
    fn json_get(&self, key: &str, path: &str) -> impl Future<Output = anyhow::Result<Option<Value>>> + Send;

    /// One slot per key, in order; absent keys are `None`.
    fn json_mget(
        &self,
        keys: &[String],
        path: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<Option<Value>>>> + Send;

    fn json_set(&self, key: &str, path: &str, value: &Value) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn json_del(&self, key: &str, path: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn json_arr_append(&self, key: &str, path: &str, value: &Value) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn json_arr_insert(
        &self,
        key: &str,
        path: &str,
        index: i64,
        value: &Value,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub data: Value,
    pub last_cached_at: i64,
    pub is_stale: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CacheResult<T> {
    Hit(T),
    Miss,
    Unavailable(String),
}

impl<T> CacheResult<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheResult::Hit(_))
    }

    pub fn hit(self) -> Option<T> {
        match self {
            CacheResult::Hit(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_hit(&self) -> Option<&T> {
        match self {
            CacheResult::Hit(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cache unavailable: {0}")]
pub struct CacheError(pub String);

pub type CacheWrite = Result<(), CacheError>;

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `true` once more than `ttl` has elapsed since `last_cached_at`.
pub fn is_stale_at(last_cached_at: i64, now: i64, ttl: Duration) -> bool {
    now.saturating_sub(last_cached_at) > ttl.as_millis() as i64
}

pub struct Cache<S> {
    store: S,
    ttl: Duration,
}

impl<S: JsonStore> Cache<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entry_from(&self, doc: Value, now: i64) -> Entry {
        let last_cached_at = doc.get("lastCachedAt").and_then(Value::as_i64).unwrap_or(0);
        let data = match doc {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            other => other,
        };
        Entry {
            data,
            last_cached_at,
            is_stale: is_stale_at(last_cached_at, now, self.ttl),
        }
    }

    fn written(op: &str, key: &str, res: anyhow::Result<()>) -> CacheWrite {
        res.map_err(|e| {
            tracing::warn!(%key, error = %e, "cache {op} failed");
            CacheError(e.to_string())
        })
    }

    pub async fn get(&self, key: &str) -> CacheResult<Entry> {
        match self.store.json_get(key, "$").await {
            Ok(Some(doc)) => CacheResult::Hit(self.entry_from(doc, now_ms())),
            Ok(None) => CacheResult::Miss,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache read failed");
                CacheResult::Unavailable(e.to_string())
            }
        }
    }

    pub async fn get_many(&self, keys: &[String]) -> Vec<CacheResult<Entry>> {
        match self.store.json_mget(keys, "$").await {
            Ok(docs) => {
                let now = now_ms();
                docs.into_iter()
                    .map(|doc| match doc {
                        Some(doc) => CacheResult::Hit(self.entry_from(doc, now)),
                        None => CacheResult::Miss,
                    })
                    .collect()
            }
            Err(e) => {
                tracing::warn!(count = keys.len(), error = %e, "cache multi-read failed");
                let reason = e.to_string();
                keys.iter()
                    .map(|_| CacheResult::Unavailable(reason.clone()))
                    .collect()
            }
        }
    }

    /// Replace the whole document, stamping `lastCachedAt`.
    pub async fn put(&self, key: &str, data: &Value) -> CacheWrite {
        let doc = json!({ "data": data, "lastCachedAt": now_ms() });
        Self::written("put", key, self.store.json_set(key, "$", &doc).await)
    }

    pub async fn set_at_path(&self, key: &str, path: &str, value: &Value) -> CacheWrite {
        Self::written("set", key, self.store.json_set(key, path, value).await)?;
        Self::written(
            "touch",
            key,
            self.store.json_set(key, "$.lastCachedAt", &json!(now_ms())).await,
        )
    }

    /// Drop the document (`None`) or one path inside it.
    pub async fn remove_at(&self, key: &str, path: Option<&str>) -> CacheWrite {
        Self::written("delete", key, self.store.json_del(key, path.unwrap_or("$")).await)
    }

    pub async fn append(&self, key: &str, path: &str, value: &Value) -> CacheWrite {
        Self::written("append", key, self.store.json_arr_append(key, path, value).await)
    }

    pub async fn insert_at(&self, key: &str, path: &str, index: i64, value: &Value) -> CacheWrite {
        Self::written(
            "insert",
            key,
            self.store.json_arr_insert(key, path, index, value).await,
        )
    }

    /// Append to a cached id list, creating the list when absent.
    pub async fn push_to_list(&self, key: &str, value: &Value) -> CacheWrite {
        match self.get(key).await {
            CacheResult::Hit(_) => self.append(key, "$.data", value).await,
            CacheResult::Miss => self.put(key, &json!([value])).await,
            CacheResult::Unavailable(reason) => Err(CacheError(reason)),
        }
    }

    /// Like [`Cache::push_to_list`], but a value already in the list is
    /// left alone.
    pub async fn push_unique(&self, key: &str, value: &Value) -> CacheWrite {
        match self.get(key).await {
            CacheResult::Hit(entry) => {
                let present = entry
                    .data
                    .as_array()
                    .is_some_and(|items| items.contains(value));
                if present {
                    return Ok(());
                }
                self.append(key, "$.data", value).await
            }
            CacheResult::Miss => self.put(key, &json!([value])).await,
            CacheResult::Unavailable(reason) => Err(CacheError(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_boundary() {
        let ttl = Duration::from_secs(180);
        let now = 1_700_000_000_000;
        assert!(!is_stale_at(now - 180_000, now, ttl));
        assert!(is_stale_at(now - 180_001, now, ttl));
    }

    #[tokio::test]
    async fn put_then_get() {
        let cache = Cache::new(MemoryStore::new());
        cache.put("groups", &json!([1, 2])).await.unwrap();
        let entry = cache.get("groups").await.hit().unwrap();
        assert_eq!(entry.data, json!([1, 2]));
        assert!(!entry.is_stale);
    }

    #[tokio::test]
    async fn set_at_path_bumps_timestamp() {
        let store = MemoryStore::new();
        store
            .json_set("k", "$", &json!({"data": {"upvote": 1}, "lastCachedAt": 0}))
            .await
            .unwrap();
        let cache = Cache::new(store);
        assert!(cache.get("k").await.hit().unwrap().is_stale);

        cache.set_at_path("k", "$.data.upvote", &json!(2)).await.unwrap();
        let entry = cache.get("k").await.hit().unwrap();
        assert_eq!(entry.data["upvote"], 2);
        assert!(!entry.is_stale);
    }

    #[tokio::test]
    async fn push_to_list_creates_then_appends() {
        let cache = Cache::new(MemoryStore::new());
        cache.push_to_list("1_posts", &json!(4)).await.unwrap();
        cache.push_to_list("1_posts", &json!(5)).await.unwrap();
        assert_eq!(cache.get("1_posts").await.hit().unwrap().data, json!([4, 5]));
    }

    #[tokio::test]
    async fn push_unique_skips_duplicates() {
        let cache = Cache::new(MemoryStore::new());
        cache.push_unique("3_members", &json!("11")).await.unwrap();
        cache.push_unique("3_members", &json!("11")).await.unwrap();
        cache.push_unique("3_members", &json!("12")).await.unwrap();
        assert_eq!(cache.get("3_members").await.hit().unwrap().data, json!(["11", "12"]));
    }

    #[tokio::test]
    async fn write_errors_are_values() {
        let cache = Cache::new(MemoryStore::new());
        assert!(cache.append("missing", "$.data", &json!(1)).await.is_err());
        assert!(cache.set_at_path("missing", "$.data.x", &json!(1)).await.is_err());
    }

    #[tokio::test]
    async fn remove_whole_document() {
        let cache = Cache::new(MemoryStore::new());
        cache.put("k", &json!({"a": 1})).await.unwrap();
        cache.remove_at("k", Some("$.data.a")).await.unwrap();
        assert_eq!(cache.get("k").await.hit().unwrap().data, json!({}));
        cache.remove_at("k", None).await.unwrap();
        assert_eq!(cache.get("k").await, CacheResult::Miss);
    }
}
