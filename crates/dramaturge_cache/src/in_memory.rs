//! In-memory cache store.
//!
//! Backs tests and single-process deployments that don't want a
//! database. Semantics mirror the Postgres store: upsert on the
//! (content_hash, provider, model) key, expiry filtering on point
//! lookup, persisted hit/miss counters.

use async_trait::async_trait;
use chrono::Utc;
use dramaturge_error::DramaturgeResult;
use dramaturge_interface::{AnalysisCacheEntry, CacheFilter, CacheKey, CacheRepository, CacheStats};
use std::collections::HashMap;
use tokio::sync::Mutex;

const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<CacheKey, AnalysisCacheEntry>,
    next_id: i32,
    hits: i64,
    misses: i64,
}

/// A `CacheRepository` backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    state: Mutex<StoreState>,
}

impl InMemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheRepository for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> DramaturgeResult<Option<AnalysisCacheEntry>> {
        let state = self.state.lock().await;
        let now = Utc::now();
        Ok(state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .cloned())
    }

    async fn get_by_id(&self, id: i32) -> DramaturgeResult<Option<AnalysisCacheEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .values()
            .find(|entry| entry.id == Some(id))
            .cloned())
    }

    async fn upsert(&self, entry: &AnalysisCacheEntry) -> DramaturgeResult<i32> {
        let mut state = self.state.lock().await;
        let key = entry.key();
        let id = match state.entries.get(&key) {
            Some(existing) => existing.id.unwrap_or_default(),
            None => {
                state.next_id += 1;
                state.next_id
            }
        };
        let mut stored = entry.clone();
        stored.id = Some(id);
        if stored.created_at.is_none() {
            stored.created_at = Some(Utc::now());
        }
        state.entries.insert(key, stored);
        Ok(id)
    }

    async fn delete(&self, id: i32) -> DramaturgeResult<bool> {
        let mut state = self.state.lock().await;
        let key = state
            .entries
            .iter()
            .find(|(_, entry)| entry.id == Some(id))
            .map(|(key, _)| key.clone());
        Ok(match key {
            Some(key) => state.entries.remove(&key).is_some(),
            None => false,
        })
    }

    async fn delete_by_hash(&self, content_hash: &str) -> DramaturgeResult<usize> {
        let mut state = self.state.lock().await;
        let before = state.entries.len();
        state.entries.retain(|key, _| key.content_hash != content_hash);
        Ok(before - state.entries.len())
    }

    async fn list(&self, filter: &CacheFilter) -> DramaturgeResult<(Vec<AnalysisCacheEntry>, i64)> {
        let state = self.state.lock().await;
        let mut matching: Vec<AnalysisCacheEntry> = state
            .entries
            .values()
            .filter(|entry| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|needle| entry.script_name.contains(needle))
                    && filter
                        .provider
                        .as_deref()
                        .is_none_or(|provider| entry.provider == provider)
                    && filter
                        .model
                        .as_deref()
                        .is_none_or(|model| entry.model == model)
            })
            .cloned()
            .collect();
        let total = matching.len() as i64;

        // Newest first.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let limit = if filter.limit > 0 {
            filter.limit
        } else {
            DEFAULT_PAGE_SIZE
        };
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn cleanup_expired(&self) -> DramaturgeResult<usize> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - state.entries.len())
    }

    async fn clear_all(&self) -> DramaturgeResult<usize> {
        let mut state = self.state.lock().await;
        let removed = state.entries.len();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        Ok(removed)
    }

    async fn record_hit(&self) -> DramaturgeResult<()> {
        self.state.lock().await.hits += 1;
        Ok(())
    }

    async fn record_miss(&self) -> DramaturgeResult<()> {
        self.state.lock().await.misses += 1;
        Ok(())
    }

    async fn stats(&self) -> DramaturgeResult<CacheStats> {
        let state = self.state.lock().await;
        let probes = state.hits + state.misses;
        let mut entries_by_provider: HashMap<String, i64> = HashMap::new();
        let mut entries_by_model: HashMap<String, i64> = HashMap::new();
        for entry in state.entries.values() {
            *entries_by_provider.entry(entry.provider.clone()).or_default() += 1;
            *entries_by_model.entry(entry.model.clone()).or_default() += 1;
        }
        Ok(CacheStats {
            total_entries: state.entries.len() as i64,
            total_hits: state.hits,
            total_misses: state.misses,
            hit_rate: if probes > 0 {
                state.hits as f64 / probes as f64
            } else {
                0.0
            },
            oldest_entry: state.entries.values().filter_map(|e| e.created_at).min(),
            newest_entry: state.entries.values().filter_map(|e| e.created_at).max(),
            entries_by_provider,
            entries_by_model,
        })
    }
}
