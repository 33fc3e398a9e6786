//! Three-stage analysis pipeline for the Dramaturge script analysis
//! engine.
//!
//! The pipeline runs a screenplay through three model-backed stages:
//! the Discoverer identifies long-running conflict threads, the Auditor
//! ranks them into narrative lines, and the Modifier repairs structural
//! defects found by a deterministic integrity scan. A state machine
//! with a shared retry budget orchestrates the stages; sanitization,
//! validation, and reconciliation guard every model boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod executor;
mod integrity;
mod metrics;
mod prompts;
mod reconcile;
mod sanitize;
mod score;
mod state;
mod validate;

pub use config::{
    PipelineConfig, PipelineConfigBuilder, ReconcilerConfig, ReconcilerConfigBuilder,
};
pub use executor::{AnalysisRun, StageExecutor};
pub use integrity::{MAX_ISSUES, audit_script, validate_setup_payoff_integrity};
pub use metrics::RunMetrics;
pub use prompts::{AUDITOR_PROMPT, DISCOVERER_PROMPT, MODIFIER_PROMPT};
pub use reconcile::{
    ReconcileOutcome, filter_low_coverage, independence_warnings, merge_antagonist_mirrors,
    merge_mirror_tccs, overlap_ratio, reconcile, verify_evidence,
};
pub use sanitize::sanitize_response;
pub use score::{a_line_interaction, heart_score, setup_payoff_density, spine_score};
pub use state::{RETRY_CAP, Stage, StageOutcome, advance};
pub use validate::{
    ISSUE_ID_PATTERN, SCENE_ID_PATTERN, TCC_ID_PATTERN, parse_auditor, parse_discoverer,
    parse_modifier, validate_script,
};
