//! Cache store boundary: entry records and the repository trait.
//!
//! These types are shared between the memoization layer (in
//! `dramaturge_cache`) and the persistence backends (in-memory and
//! `dramaturge_database`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dramaturge_error::DramaturgeResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique cache key: one completed analysis per script content,
/// provider, and model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Digest over the exact script content (byte-exact, not normalized)
    pub content_hash: String,
    /// Model provider name
    pub provider: String,
    /// Model name
    pub model: String,
}

impl CacheKey {
    /// Create a key from its components.
    pub fn new(
        content_hash: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            content_hash: content_hash.into(),
            provider: provider.into(),
            model: model.into(),
        }
    }
}

/// A cached analysis row.
///
/// Stage payloads are stored as JSON strings; a row with any missing
/// stage payload is incomplete and must be reported as a miss by the
/// memoization layer, while remaining visible to listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisCacheEntry {
    /// Row id, assigned by the store
    pub id: Option<i32>,
    /// Content hash component of the key
    pub content_hash: String,
    /// Original script name
    pub script_name: String,
    /// Provider component of the key
    pub provider: String,
    /// Model component of the key
    pub model: String,
    /// Parsed script JSON
    pub parsed_script: Option<String>,
    /// Stage 1 result JSON
    pub stage1_result: Option<String>,
    /// Stage 2 result JSON
    pub stage2_result: Option<String>,
    /// Stage 3 result JSON
    pub stage3_result: Option<String>,
    /// Number of scenes analyzed
    pub scene_count: Option<i32>,
    /// Number of threads identified
    pub tcc_count: Option<i32>,
    /// Total processing time in seconds
    pub processing_time: Option<f64>,
    /// Number of model calls made
    pub api_calls: Option<i32>,
    /// Row creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Row expiry time
    pub expires_at: Option<DateTime<Utc>>,
}

impl AnalysisCacheEntry {
    /// Key components of this entry.
    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.content_hash, &self.provider, &self.model)
    }

    /// Whether all three stage payloads are present.
    pub fn is_complete(&self) -> bool {
        self.stage1_result.is_some() && self.stage2_result.is_some() && self.stage3_result.is_some()
    }

    /// Whether the row has passed its expiry time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires < now)
    }
}

/// Filter and pagination parameters for cache listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheFilter {
    /// Substring match on script name
    pub search: Option<String>,
    /// Exact provider filter
    pub provider: Option<String>,
    /// Exact model filter
    pub model: Option<String>,
    /// Page size (0 means store default)
    pub limit: i64,
    /// Page offset
    pub offset: i64,
}

/// Persisted hit/miss counters and entry summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total rows in the store
    pub total_entries: i64,
    /// Persisted hit counter
    pub total_hits: i64,
    /// Persisted miss counter
    pub total_misses: i64,
    /// hits / (hits + misses), 0 when no probes recorded
    pub hit_rate: f64,
    /// Oldest row creation time
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Newest row creation time
    pub newest_entry: Option<DateTime<Utc>>,
    /// Row counts per provider
    pub entries_by_provider: HashMap<String, i64>,
    /// Row counts per model
    pub entries_by_model: HashMap<String, i64>,
}

/// The cache store boundary.
///
/// Any store supporting upsert-on-unique-key, point lookup, filtered
/// listing, and bulk delete satisfies this contract. All mutating
/// operations must be atomic against the backing store so concurrent
/// callers cannot lose updates.
#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// Look up an unexpired row by key. Completeness gating is the
    /// caller's concern; expired rows are never returned.
    async fn get(&self, key: &CacheKey) -> DramaturgeResult<Option<AnalysisCacheEntry>>;

    /// Look up a row by store id, regardless of expiry.
    async fn get_by_id(&self, id: i32) -> DramaturgeResult<Option<AnalysisCacheEntry>>;

    /// Insert or overwrite the row for the entry's key, returning its
    /// id. A repeat call with the same key replaces the existing row
    /// and resets its creation/expiry timestamps.
    async fn upsert(&self, entry: &AnalysisCacheEntry) -> DramaturgeResult<i32>;

    /// Delete a row by id. Returns whether a row was removed.
    async fn delete(&self, id: i32) -> DramaturgeResult<bool>;

    /// Delete all rows for a content hash. Returns the removed count.
    async fn delete_by_hash(&self, content_hash: &str) -> DramaturgeResult<usize>;

    /// List rows matching the filter, newest first, with the total
    /// matching count.
    async fn list(&self, filter: &CacheFilter) -> DramaturgeResult<(Vec<AnalysisCacheEntry>, i64)>;

    /// Delete all rows past their expiry. Returns the removed count.
    async fn cleanup_expired(&self) -> DramaturgeResult<usize>;

    /// Unconditionally empty the store and reset counters. Returns the
    /// removed count.
    async fn clear_all(&self) -> DramaturgeResult<usize>;

    /// Atomically increment the persisted hit counter.
    async fn record_hit(&self) -> DramaturgeResult<()>;

    /// Atomically increment the persisted miss counter.
    async fn record_miss(&self) -> DramaturgeResult<()>;

    /// Current statistics snapshot.
    async fn stats(&self) -> DramaturgeResult<CacheStats>;
}
