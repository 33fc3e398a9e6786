//! Stage 1 (Discoverer) output schema: conflict-thread candidates.

use serde::{Deserialize, Serialize};

/// The kind of conflict a thread expresses.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    /// Conflict between characters
    #[display("interpersonal")]
    Interpersonal,
    /// Conflict within a character
    #[display("internal")]
    Internal,
    /// Conflict between worldviews
    #[display("ideological")]
    Ideological,
}

/// A conflict-thread candidate spanning multiple scenes.
///
/// Created by Stage 1; may be merged, trimmed, or confidence-penalized
/// by the reconciler, then frozen before Stage 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tcc {
    /// Thread identifier (`TCC_NN`)
    pub tcc_id: String,
    /// What the thread's driving party ultimately wants (10-200 chars)
    pub super_objective: String,
    /// Conflict type
    pub core_conflict_type: ConflictType,
    /// Scene ids where this thread appears (at least 2)
    pub evidence_scenes: Vec<String>,
    /// Confidence score in [0.5, 1.0]
    pub confidence: f64,
}

/// Metadata from the Discoverer stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscovererMetadata {
    /// Total scenes the model analyzed
    pub total_scenes_analyzed: u32,
    /// Whether primary structural evidence was available
    pub primary_evidence_available: bool,
    /// Whether the model fell back to secondary evidence
    pub fallback_mode: bool,
    /// Reason for falling back, when applicable
    #[serde(default)]
    pub fallback_reason: Option<String>,
}

/// Output from Stage 1: Discoverer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscovererOutput {
    /// Identified conflict-thread candidates (1-5)
    pub tccs: Vec<Tcc>,
    /// Stage metadata
    pub metadata: DiscovererMetadata,
}
