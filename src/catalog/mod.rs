//! Model catalog
//!
//! A TTL'd LRU cache of model listings keyed by provider. Refreshes are
//! single-flight per key: concurrent callers for the same provider share
//! one upstream fetch, and a listing that has outlived its TTL is still
//! served (flagged stale) when the refresh attempt fails.
//!
//! The catalog does not talk to the network itself; callers hand
//! [`ModelCatalog::get_models`] a fetch future, which runs at most once
//! per call and only when the cache cannot answer.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lru::LruCache;
use tokio::sync::Mutex;

use crate::defaults;
use crate::error::GenError;
use crate::types::models::{ModelCapability, ModelInfo};

/// Per-call fetch behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Bypass the cache and require a live fetch; failures propagate even
    /// when a stale entry exists
    pub force_refresh: bool,
    /// TTL for the entry written by this fetch, instead of the default
    pub ttl: Option<Duration>,
}

impl FetchOptions {
    /// Default behavior: cached when fresh, fetched otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a live fetch.
    pub const fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Override the TTL written with this fetch.
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A model listing as served to callers.
#[derive(Debug, Clone)]
pub struct ModelList {
    /// The fetched entries, shared with the cache
    pub models: Arc<Vec<ModelInfo>>,
    /// Whether this listing outlived its TTL and was served because a
    /// refresh attempt failed
    pub stale: bool,
    /// Wall-clock time of the fetch that produced the listing
    pub fetched_at: DateTime<Utc>,
}

struct CacheEntry {
    models: Arc<Vec<ModelInfo>>,
    fetched_at: Instant,
    fetched_wall: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// TTL'd, single-flight model listing cache keyed by provider.
pub struct ModelCatalog {
    entries: Mutex<LruCache<String, CacheEntry>>,
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelCatalog {
    /// A catalog with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(defaults::models::CACHE_CAPACITY)
    }

    /// A catalog keeping at most `capacity` provider listings.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// Serve the listing for `key`, fetching through `fetch` when the
    /// cache cannot answer.
    ///
    /// Fails only when `force_refresh` is set or no cached entry exists;
    /// otherwise a failed refresh falls back to the stale entry.
    pub async fn get_models<F, Fut>(
        &self,
        key: &str,
        options: FetchOptions,
        fetch: F,
    ) -> Result<ModelList, GenError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ModelInfo>, GenError>>,
    {
        if !options.force_refresh
            && let Some(list) = self.cached_list(key, true).await
        {
            tracing::debug!(
                target: "anygen::models",
                provider = key,
                "serving cached model listing"
            );
            return Ok(list);
        }

        let guard = self.refresh_guard(key).await;
        let _flight = guard.lock().await;

        // Another flight may have refreshed while we waited on the guard.
        if !options.force_refresh
            && let Some(list) = self.cached_list(key, true).await
        {
            return Ok(list);
        }

        match fetch().await {
            Ok(models) => {
                let entry = CacheEntry {
                    models: Arc::new(models),
                    fetched_at: Instant::now(),
                    fetched_wall: Utc::now(),
                    ttl: options.ttl.unwrap_or(defaults::models::TTL),
                };
                let list = ModelList {
                    models: Arc::clone(&entry.models),
                    stale: false,
                    fetched_at: entry.fetched_wall,
                };
                self.entries.lock().await.put(key.to_string(), entry);
                tracing::info!(
                    target: "anygen::models",
                    provider = key,
                    count = list.models.len(),
                    "model listing refreshed"
                );
                Ok(list)
            }
            Err(error) => {
                if !options.force_refresh
                    && let Some(list) = self.cached_list(key, false).await
                {
                    tracing::warn!(
                        target: "anygen::models",
                        provider = key,
                        error = %error,
                        "refresh failed, serving stale model listing"
                    );
                    return Ok(list);
                }
                Err(error)
            }
        }
    }

    /// Drop one provider's cached listing; returns whether one existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.lock().await.pop(key).is_some()
    }

    /// Drop every cached listing.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    async fn cached_list(&self, key: &str, require_fresh: bool) -> Option<ModelList> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        let fresh = entry.is_fresh();
        if require_fresh && !fresh {
            return None;
        }
        Some(ModelList {
            models: Arc::clone(&entry.models),
            stale: !fresh,
            fetched_at: entry.fetched_wall,
        })
    }

    async fn refresh_guard(&self, key: &str) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().await;
        Arc::clone(guards.entry(key.to_string()).or_default())
    }
}

/// Filter a model listing down to entries matching a capability.
///
/// When no entry matches, the full listing is returned unchanged:
/// providers with opaque model names should stay usable rather than
/// appear empty.
pub fn filter_by_capability(models: &[ModelInfo], capability: ModelCapability) -> Vec<ModelInfo> {
    let filtered: Vec<ModelInfo> = models
        .iter()
        .filter(|model| capability.matches(&model.id))
        .cloned()
        .collect();
    if filtered.is_empty() {
        models.to_vec()
    } else {
        filtered
    }
}
