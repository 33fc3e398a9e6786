//! The memoization layer over a cache store.
//!
//! `ResultCache` enforces the policy the stores stay agnostic of: the
//! completeness gate on lookup, hit/miss accounting, and the expiry
//! horizon on write. `CachedAnalyzer` plugs it in front of the stage
//! executor so a byte-identical script never pays for a second
//! analysis.

use crate::content_hash;
use chrono::{Duration, Utc};
use dramaturge_core::{AuditorOutput, DiscovererOutput, ModifierOutput, Script};
use dramaturge_error::{DramaturgeResult, JsonError, PipelineError, PipelineErrorKind};
use dramaturge_interface::{
    AnalysisCacheEntry, AnalysisDriver, CacheFilter, CacheKey, CacheRepository, CacheStats,
};
use dramaturge_pipeline::{AnalysisRun, PipelineConfig, Stage, StageExecutor};

const DEFAULT_EXPIRY_DAYS: i64 = 90;

/// Policy layer over a [`CacheRepository`].
pub struct ResultCache<R: CacheRepository> {
    store: R,
    expiry: Duration,
}

impl<R: CacheRepository> ResultCache<R> {
    /// Wrap a store with the default 90-day expiry horizon.
    pub fn new(store: R) -> Self {
        Self {
            store,
            expiry: Duration::days(DEFAULT_EXPIRY_DAYS),
        }
    }

    /// Wrap a store with a custom expiry horizon.
    pub fn with_expiry(store: R, expiry: Duration) -> Self {
        Self { store, expiry }
    }

    /// The underlying store.
    pub fn store(&self) -> &R {
        &self.store
    }

    /// Probe for a completed analysis.
    ///
    /// An expired or incomplete row is a miss; only a row with all
    /// three stage payloads counts as a hit. Every probe moves exactly
    /// one persisted counter.
    pub async fn lookup(&self, key: &CacheKey) -> DramaturgeResult<Option<AnalysisCacheEntry>> {
        match self.store.get(key).await? {
            Some(entry) if entry.is_complete() => {
                self.store.record_hit().await?;
                tracing::debug!(hash = %key.content_hash, "Cache hit");
                Ok(Some(entry))
            }
            Some(_) => {
                self.store.record_miss().await?;
                tracing::debug!(hash = %key.content_hash, "Incomplete cache row, treating as miss");
                Ok(None)
            }
            None => {
                self.store.record_miss().await?;
                tracing::debug!(hash = %key.content_hash, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Persist a completed run under the given key, stamping creation
    /// and expiry times. Re-storing the same key replaces the row.
    pub async fn store_run(
        &self,
        key: &CacheKey,
        script_name: &str,
        script: &Script,
        run: &AnalysisRun,
    ) -> DramaturgeResult<i32> {
        let discoverer = run.discoverer_output.as_ref().ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::MissingStageOutput("discover".to_string()))
        })?;
        let auditor = run.auditor_output.as_ref().ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::MissingStageOutput("audit".to_string()))
        })?;
        let modifier = run.modifier_output.as_ref().ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::MissingStageOutput("modify".to_string()))
        })?;

        let now = Utc::now();
        let entry = AnalysisCacheEntry {
            id: None,
            content_hash: key.content_hash.clone(),
            script_name: script_name.to_string(),
            provider: key.provider.clone(),
            model: key.model.clone(),
            parsed_script: Some(to_json(script)?),
            stage1_result: Some(to_json(discoverer)?),
            stage2_result: Some(to_json(auditor)?),
            stage3_result: Some(to_json(modifier)?),
            scene_count: Some(script.scene_count() as i32),
            tcc_count: Some(discoverer.tccs.len() as i32),
            processing_time: Some(run.metrics.total_duration()),
            api_calls: Some(run.metrics.total_model_calls() as i32),
            created_at: Some(now),
            expires_at: Some(now + self.expiry),
        };
        self.store.upsert(&entry).await
    }

    /// Fetch a row by store id, regardless of expiry or completeness.
    pub async fn get_by_id(&self, id: i32) -> DramaturgeResult<Option<AnalysisCacheEntry>> {
        self.store.get_by_id(id).await
    }

    /// Delete a row by id.
    pub async fn delete(&self, id: i32) -> DramaturgeResult<bool> {
        self.store.delete(id).await
    }

    /// Delete every row for a content hash.
    pub async fn delete_by_hash(&self, content_hash: &str) -> DramaturgeResult<usize> {
        self.store.delete_by_hash(content_hash).await
    }

    /// List rows, newest first, with the total matching count.
    pub async fn list(
        &self,
        filter: &CacheFilter,
    ) -> DramaturgeResult<(Vec<AnalysisCacheEntry>, i64)> {
        self.store.list(filter).await
    }

    /// Remove expired rows, returning how many were dropped.
    pub async fn cleanup_expired(&self) -> DramaturgeResult<usize> {
        let removed = self.store.cleanup_expired().await?;
        if removed > 0 {
            tracing::info!(removed, "Cleaned up expired cache entries");
        }
        Ok(removed)
    }

    /// Empty the store and reset its counters.
    pub async fn clear_all(&self) -> DramaturgeResult<usize> {
        self.store.clear_all().await
    }

    /// Current statistics snapshot.
    pub async fn stats(&self) -> DramaturgeResult<CacheStats> {
        self.store.stats().await
    }
}

/// A completed analysis, either fresh or replayed from the cache.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Stage 1 output
    pub discoverer: DiscovererOutput,
    /// Stage 2 output
    pub auditor: AuditorOutput,
    /// Stage 3 output
    pub modifier: ModifierOutput,
    /// Whether the result was replayed from the cache
    pub from_cache: bool,
    /// Model calls spent producing this result (0 on replay)
    pub api_calls: u32,
    /// Non-fatal warnings accumulated during the run
    pub warnings: Vec<String>,
}

/// The stage executor fronted by the result cache.
pub struct CachedAnalyzer<D: AnalysisDriver, R: CacheRepository> {
    executor: StageExecutor<D>,
    cache: ResultCache<R>,
}

impl<D: AnalysisDriver, R: CacheRepository> CachedAnalyzer<D, R> {
    /// Build an analyzer from a driver, config, and cache store.
    pub fn new(driver: D, config: PipelineConfig, store: R) -> Self {
        Self {
            executor: StageExecutor::new(driver, config),
            cache: ResultCache::new(store),
        }
    }

    /// The cache layer, for admin operations.
    pub fn cache(&self) -> &ResultCache<R> {
        &self.cache
    }

    /// Analyze a script, replaying a cached result when the exact
    /// content was already analyzed by the same provider and model.
    ///
    /// A cache write failure never discards a completed analysis; it
    /// becomes a warning on the result. Lookup failures propagate,
    /// since silently re-running would hide a broken store.
    #[tracing::instrument(skip(self, content, script))]
    pub async fn analyze(
        &self,
        script_name: &str,
        content: &str,
        script: &Script,
    ) -> DramaturgeResult<AnalysisResult> {
        let key = CacheKey::new(
            content_hash(content),
            self.executor.driver().provider_name(),
            self.executor.driver().model_name(),
        );

        if let Some(entry) = self.cache.lookup(&key).await? {
            return replay(&entry);
        }

        let run = self.executor.run(script).await;
        if run.final_stage != Some(Stage::Done) || !run.is_complete() {
            tracing::error!(
                retries = run.retry_count,
                errors = ?run.errors,
                "Analysis failed, nothing to cache"
            );
            return Err(
                PipelineError::new(PipelineErrorKind::RetriesExhausted(run.retry_count)).into(),
            );
        }

        let mut warnings = run.errors.clone();
        if let Err(e) = self.cache.store_run(&key, script_name, script, &run).await {
            tracing::warn!(error = %e, "Failed to cache analysis result");
            warnings.push(format!("cache write failed: {e}"));
        }

        let api_calls = run.metrics.total_model_calls();
        match (run.discoverer_output, run.auditor_output, run.modifier_output) {
            (Some(discoverer), Some(auditor), Some(modifier)) => Ok(AnalysisResult {
                discoverer,
                auditor,
                modifier,
                from_cache: false,
                api_calls,
                warnings,
            }),
            // Unreachable past the is_complete check above.
            _ => Err(PipelineError::new(PipelineErrorKind::MissingStageOutput(
                "modify".to_string(),
            ))
            .into()),
        }
    }
}

fn replay(entry: &AnalysisCacheEntry) -> DramaturgeResult<AnalysisResult> {
    Ok(AnalysisResult {
        discoverer: from_json(entry.stage1_result.as_deref(), "stage1_result")?,
        auditor: from_json(entry.stage2_result.as_deref(), "stage2_result")?,
        modifier: from_json(entry.stage3_result.as_deref(), "stage3_result")?,
        from_cache: true,
        api_calls: 0,
        warnings: Vec::new(),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> DramaturgeResult<String> {
    serde_json::to_string(value).map_err(|e| JsonError::new(e.to_string()).into())
}

fn from_json<T: serde::de::DeserializeOwned>(
    json: Option<&str>,
    field: &str,
) -> DramaturgeResult<T> {
    let json = json.ok_or_else(|| JsonError::new(format!("cached {field} is missing")))?;
    serde_json::from_str(json)
        .map_err(|e| JsonError::new(format!("cached {field} is corrupt: {e}")).into())
}
