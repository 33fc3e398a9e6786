//! Integration tests for the memoization layer and in-memory store.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dramaturge_cache::{CachedAnalyzer, InMemoryCacheStore, ResultCache, content_hash};
use dramaturge_core::{GenerateRequest, GenerateResponse, Scene, Script, SetupPayoff};
use dramaturge_error::DramaturgeResult;
use dramaturge_interface::{
    AnalysisCacheEntry, AnalysisDriver, CacheFilter, CacheKey, CacheRepository,
};
use dramaturge_pipeline::PipelineConfig;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

fn entry(hash: &str, name: &str, provider: &str, model: &str) -> AnalysisCacheEntry {
    AnalysisCacheEntry {
        content_hash: hash.to_string(),
        script_name: name.to_string(),
        provider: provider.to_string(),
        model: model.to_string(),
        parsed_script: Some("{}".to_string()),
        stage1_result: Some("{}".to_string()),
        stage2_result: Some("{}".to_string()),
        stage3_result: Some("{}".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_upsert_replaces_row_for_same_key() {
    let store = InMemoryCacheStore::new();

    let first = store.upsert(&entry("abc", "draft_v1", "deepseek", "chat")).await.unwrap();
    let second = store.upsert(&entry("abc", "draft_v2", "deepseek", "chat")).await.unwrap();
    assert_eq!(first, second);

    let (rows, total) = store.list(&CacheFilter::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].script_name, "draft_v2");

    // A different model is a different key.
    let third = store.upsert(&entry("abc", "draft_v2", "deepseek", "coder")).await.unwrap();
    assert_ne!(first, third);
    let (_, total) = store.list(&CacheFilter::default()).await.unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_incomplete_row_is_a_miss_but_still_listed() {
    let store = InMemoryCacheStore::new();
    let mut partial = entry("abc", "draft", "deepseek", "chat");
    partial.stage3_result = None;
    store.upsert(&partial).await.unwrap();

    let cache = ResultCache::new(store);
    let key = CacheKey::new("abc", "deepseek", "chat");
    assert!(cache.lookup(&key).await.unwrap().is_none());

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.total_misses, 1);
    assert_eq!(stats.total_hits, 0);
    assert_eq!(stats.total_entries, 1);

    let (rows, total) = cache.list(&CacheFilter::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].script_name, "draft");
}

#[tokio::test]
async fn test_complete_row_is_a_hit() {
    let store = InMemoryCacheStore::new();
    store.upsert(&entry("abc", "draft", "deepseek", "chat")).await.unwrap();

    let cache = ResultCache::new(store);
    let key = CacheKey::new("abc", "deepseek", "chat");
    assert!(cache.lookup(&key).await.unwrap().is_some());

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.total_hits, 1);
    assert!((stats.hit_rate - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_expired_row_invisible_and_cleaned_up() {
    let store = InMemoryCacheStore::new();
    let mut expired = entry("abc", "draft", "deepseek", "chat");
    expired.expires_at = Some(Utc::now() - Duration::days(1));
    store.upsert(&expired).await.unwrap();

    let key = CacheKey::new("abc", "deepseek", "chat");
    assert!(store.get(&key).await.unwrap().is_none());

    assert_eq!(store.cleanup_expired().await.unwrap(), 1);
    let (_, total) = store.list(&CacheFilter::default()).await.unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_clear_all_resets_counters() {
    let store = InMemoryCacheStore::new();
    store.upsert(&entry("abc", "draft", "deepseek", "chat")).await.unwrap();
    store.record_hit().await.unwrap();
    store.record_miss().await.unwrap();

    assert_eq!(store.clear_all().await.unwrap(), 1);
    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_entries, 0);
    assert_eq!(stats.total_hits, 0);
    assert_eq!(stats.total_misses, 0);
    assert!((stats.hit_rate).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let store = InMemoryCacheStore::new();
    store.upsert(&entry("h1", "spring_draft", "deepseek", "chat")).await.unwrap();
    store.upsert(&entry("h2", "summer_draft", "deepseek", "chat")).await.unwrap();
    store.upsert(&entry("h3", "spring_final", "anthropic", "claude")).await.unwrap();

    let by_provider = CacheFilter {
        provider: Some("deepseek".to_string()),
        ..Default::default()
    };
    let (rows, total) = store.list(&by_provider).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(rows.len(), 2);

    let by_search = CacheFilter {
        search: Some("spring".to_string()),
        ..Default::default()
    };
    let (_, total) = store.list(&by_search).await.unwrap();
    assert_eq!(total, 2);

    let paged = CacheFilter {
        limit: 1,
        offset: 1,
        ..Default::default()
    };
    let (rows, total) = store.list(&paged).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_delete_by_hash_and_by_id() {
    let store = InMemoryCacheStore::new();
    let id = store.upsert(&entry("h1", "draft", "deepseek", "chat")).await.unwrap();
    store.upsert(&entry("h1", "draft", "deepseek", "coder")).await.unwrap();
    store.upsert(&entry("h2", "other", "deepseek", "chat")).await.unwrap();

    assert!(store.get_by_id(id).await.unwrap().is_some());
    assert_eq!(store.delete_by_hash("h1").await.unwrap(), 2);
    assert!(store.get_by_id(id).await.unwrap().is_none());
    assert!(!store.delete(id).await.unwrap());

    let (_, total) = store.list(&CacheFilter::default()).await.unwrap();
    assert_eq!(total, 1);
}

// ---------------------------------------------------------------------------
// End-to-end memoization through CachedAnalyzer
// ---------------------------------------------------------------------------

/// Always produces the same valid three-stage outputs and counts calls.
struct CountingDriver {
    calls: AtomicUsize,
}

impl CountingDriver {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisDriver for CountingDriver {
    async fn generate(&self, req: &GenerateRequest) -> DramaturgeResult<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let system = &req.messages[0].content;
        let text = if system.contains("Through-line Conflict Candidates") {
            json!({
                "tccs": [{
                    "tcc_id": "TCC_01",
                    "super_objective": "Secure the startup funding",
                    "core_conflict_type": "interpersonal",
                    "evidence_scenes": ["S01", "S02"],
                    "confidence": 0.9
                }],
                "metadata": {
                    "total_scenes_analyzed": 2,
                    "primary_evidence_available": true,
                    "fallback_mode": false
                }
            })
            .to_string()
        } else {
            json!({
                "rankings": {
                    "a_line": {
                        "tcc_id": "TCC_01",
                        "super_objective": "Secure the startup funding",
                        "spine_score": 5.5,
                        "reasoning": {
                            "scene_count": 2,
                            "setup_payoff_density": 1.0,
                            "drives_climax": true
                        },
                        "forces": {
                            "protagonist": "Alice",
                            "primary_antagonist": "Victor"
                        }
                    },
                    "b_lines": [],
                    "c_lines": []
                },
                "metrics": {
                    "total_scenes": 2,
                    "a_line_coverage": 1.0,
                    "b_line_coverage": 0.0,
                    "c_line_coverage": 0.0
                }
            })
            .to_string()
        };
        Ok(GenerateResponse { text })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

fn script() -> Script {
    let scene = |id: &str, mission: &str, setup_for: Vec<String>, payoff_from: Vec<String>| Scene {
        scene_id: id.to_string(),
        setting: "Office".to_string(),
        characters: vec!["Alice".to_string()],
        scene_mission: mission.to_string(),
        key_events: vec![],
        info_change: vec![],
        relation_change: vec![],
        key_object: vec![],
        setup_payoff: SetupPayoff {
            setup_for,
            payoff_from,
        },
        performance_notes: vec![],
        visual_actions: vec![],
    };
    Script {
        scenes: vec![
            scene(
                "S01",
                "Alice pitches the funding plan",
                vec!["S02".to_string()],
                vec![],
            ),
            scene("S02", "The funding vote happens", vec![], vec!["S01".to_string()]),
        ],
    }
}

#[tokio::test]
async fn test_warm_cache_makes_zero_model_calls() {
    let analyzer = CachedAnalyzer::new(
        CountingDriver::new(),
        PipelineConfig::default(),
        InMemoryCacheStore::new(),
    );
    let content = "INT. OFFICE - DAY\nAlice pitches.";

    let first = analyzer.analyze("draft", content, &script()).await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.api_calls, 2);

    let second = analyzer.analyze("draft", content, &script()).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.api_calls, 0);
    assert_eq!(second.discoverer, first.discoverer);
    assert_eq!(second.modifier.validation.total_issues, 0);

    // The warm replay hit the cache, not the model.
    assert_eq!(analyzer.cache().stats().await.unwrap().total_hits, 1);

    // Different content is a fresh analysis.
    let other = analyzer
        .analyze("draft2", "INT. OFFICE - NIGHT", &script())
        .await
        .unwrap();
    assert!(!other.from_cache);
}

#[tokio::test]
async fn test_analyze_keys_on_content_hash() {
    let analyzer = CachedAnalyzer::new(
        CountingDriver::new(),
        PipelineConfig::default(),
        InMemoryCacheStore::new(),
    );
    let content = "INT. OFFICE - DAY";
    analyzer.analyze("draft", content, &script()).await.unwrap();

    let (rows, _) = analyzer
        .cache()
        .list(&CacheFilter::default())
        .await
        .unwrap();
    assert_eq!(rows[0].content_hash, content_hash(content));
    assert_eq!(rows[0].provider, "mock");
    assert_eq!(rows[0].model, "mock-model");
    assert_eq!(rows[0].scene_count, Some(2));
    assert_eq!(rows[0].tcc_count, Some(1));
    assert_eq!(rows[0].api_calls, Some(2));
    assert!(rows[0].expires_at.unwrap() > Utc::now() + Duration::days(89));
}
