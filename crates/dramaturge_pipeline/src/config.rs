//! Pipeline configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Thresholds for the Stage 1 reconciler.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct ReconcilerConfig {
    /// Evidence overlap at or above which threads auto-merge
    #[serde(default = "default_merge_threshold")]
    #[builder(default = "default_merge_threshold()")]
    merge_threshold: f64,

    /// Evidence overlap at or above which opposing threads merge as
    /// antagonist mirrors; also the residual-overlap warning threshold
    #[serde(default = "default_antagonist_threshold")]
    #[builder(default = "default_antagonist_threshold()")]
    antagonist_threshold: f64,

    /// Minimum scene-span coverage for the optional coverage filter
    #[serde(default = "default_coverage_threshold")]
    #[builder(default = "default_coverage_threshold()")]
    coverage_threshold: f64,
}

fn default_merge_threshold() -> f64 {
    0.9
}

fn default_antagonist_threshold() -> f64 {
    0.8
}

fn default_coverage_threshold() -> f64 {
    0.15
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            merge_threshold: default_merge_threshold(),
            antagonist_threshold: default_antagonist_threshold(),
            coverage_threshold: default_coverage_threshold(),
        }
    }
}

/// Sampling parameters and reconciler thresholds for a pipeline run.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct PipelineConfig {
    /// Model identifier override, forwarded to the driver
    #[serde(default)]
    #[builder(default)]
    model: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    #[builder(default = "default_temperature()")]
    temperature: Option<f32>,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    #[builder(default = "default_max_tokens()")]
    max_tokens: Option<u32>,

    /// Reconciler thresholds
    #[serde(default)]
    #[builder(default)]
    reconciler: ReconcilerConfig,
}

fn default_temperature() -> Option<f32> {
    Some(0.0)
}

fn default_max_tokens() -> Option<u32> {
    Some(4096)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}
