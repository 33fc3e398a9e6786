//! Row types and conversions for the analysis cache table.

use crate::schema::analysis_cache;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use dramaturge_interface::AnalysisCacheEntry;

/// A full row as loaded from the database.
#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = analysis_cache)]
pub struct AnalysisCacheRow {
    /// Row id
    pub id: i32,
    /// Content hash key component
    pub content_hash: String,
    /// Original script name
    pub script_name: String,
    /// Provider key component
    pub provider: String,
    /// Model key component
    pub model: String,
    /// Parsed script JSON
    pub parsed_script: Option<String>,
    /// Stage 1 result JSON
    pub stage1_result: Option<String>,
    /// Stage 2 result JSON
    pub stage2_result: Option<String>,
    /// Stage 3 result JSON
    pub stage3_result: Option<String>,
    /// Scenes analyzed
    pub scene_count: Option<i32>,
    /// Threads identified
    pub tcc_count: Option<i32>,
    /// Processing time in seconds
    pub processing_time: Option<f64>,
    /// Model calls made
    pub api_calls: Option<i32>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Expiry time
    pub expires_at: Option<DateTime<Utc>>,
}

/// Insert/update payload. `treat_none_as_null` so an upsert fully
/// replaces the previous row instead of keeping stale stage payloads.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = analysis_cache, treat_none_as_null = true)]
pub struct NewAnalysisCacheRow {
    /// Content hash key component
    pub content_hash: String,
    /// Original script name
    pub script_name: String,
    /// Provider key component
    pub provider: String,
    /// Model key component
    pub model: String,
    /// Parsed script JSON
    pub parsed_script: Option<String>,
    /// Stage 1 result JSON
    pub stage1_result: Option<String>,
    /// Stage 2 result JSON
    pub stage2_result: Option<String>,
    /// Stage 3 result JSON
    pub stage3_result: Option<String>,
    /// Scenes analyzed
    pub scene_count: Option<i32>,
    /// Threads identified
    pub tcc_count: Option<i32>,
    /// Processing time in seconds
    pub processing_time: Option<f64>,
    /// Model calls made
    pub api_calls: Option<i32>,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
    /// Expiry time
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<AnalysisCacheRow> for AnalysisCacheEntry {
    fn from(row: AnalysisCacheRow) -> Self {
        AnalysisCacheEntry {
            id: Some(row.id),
            content_hash: row.content_hash,
            script_name: row.script_name,
            provider: row.provider,
            model: row.model,
            parsed_script: row.parsed_script,
            stage1_result: row.stage1_result,
            stage2_result: row.stage2_result,
            stage3_result: row.stage3_result,
            scene_count: row.scene_count,
            tcc_count: row.tcc_count,
            processing_time: row.processing_time,
            api_calls: row.api_calls,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

impl From<&AnalysisCacheEntry> for NewAnalysisCacheRow {
    fn from(entry: &AnalysisCacheEntry) -> Self {
        NewAnalysisCacheRow {
            content_hash: entry.content_hash.clone(),
            script_name: entry.script_name.clone(),
            provider: entry.provider.clone(),
            model: entry.model.clone(),
            parsed_script: entry.parsed_script.clone(),
            stage1_result: entry.stage1_result.clone(),
            stage2_result: entry.stage2_result.clone(),
            stage3_result: entry.stage3_result.clone(),
            scene_count: entry.scene_count,
            tcc_count: entry.tcc_count,
            processing_time: entry.processing_time,
            api_calls: entry.api_calls,
            created_at: entry.created_at.or_else(|| Some(Utc::now())),
            expires_at: entry.expires_at,
        }
    }
}
