//! Run-scoped execution metrics.
//!
//! Each run owns its own `RunMetrics`; nothing is global, so concurrent
//! runs never contend or cross-contaminate.

use crate::Stage;
use serde::Serialize;
use std::collections::HashMap;

/// Per-stage counters and timings for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Cumulative wall time per stage in seconds, across retries
    stage_durations: HashMap<String, f64>,
    /// Model calls per stage
    model_calls: HashMap<String, u32>,
    /// Retries per stage
    retries: HashMap<String, u32>,
    /// Failure messages per stage
    failures: HashMap<String, Vec<String>>,
    /// Total wall time for the run in seconds
    total_duration: f64,
}

impl RunMetrics {
    /// Add elapsed wall time for one attempt of a stage.
    pub fn record_stage_duration(&mut self, stage: Stage, seconds: f64) {
        *self.stage_durations.entry(stage.to_string()).or_default() += seconds;
    }

    /// Count one model call for a stage.
    pub fn record_model_call(&mut self, stage: Stage) {
        *self.model_calls.entry(stage.to_string()).or_default() += 1;
    }

    /// Count one retry for a stage.
    pub fn record_retry(&mut self, stage: Stage) {
        *self.retries.entry(stage.to_string()).or_default() += 1;
    }

    /// Record a failure message for a stage.
    pub fn record_failure(&mut self, stage: Stage, message: impl Into<String>) {
        self.failures
            .entry(stage.to_string())
            .or_default()
            .push(message.into());
    }

    /// Set the run's total wall time.
    pub fn set_total_duration(&mut self, seconds: f64) {
        self.total_duration = seconds;
    }

    /// Model calls across all stages.
    pub fn total_model_calls(&self) -> u32 {
        self.model_calls.values().sum()
    }

    /// Retries across all stages.
    pub fn total_retries(&self) -> u32 {
        self.retries.values().sum()
    }

    /// Wall time for one stage, when recorded.
    pub fn stage_duration(&self, stage: Stage) -> Option<f64> {
        self.stage_durations.get(&stage.to_string()).copied()
    }

    /// Model calls for one stage.
    pub fn model_calls_for(&self, stage: Stage) -> u32 {
        self.model_calls
            .get(&stage.to_string())
            .copied()
            .unwrap_or(0)
    }

    /// Failure messages for one stage.
    pub fn failures_for(&self, stage: Stage) -> &[String] {
        self.failures
            .get(&stage.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The run's total wall time in seconds.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }
}
