//! Stage 2 (Auditor) output schema: thread priority rankings.

use serde::{Deserialize, Serialize};

/// Protagonist/antagonist roles within a ranked thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forces {
    /// The party driving the thread
    pub protagonist: String,
    /// The primary opposing party
    pub primary_antagonist: String,
    /// Additional shifting antagonists, when present
    #[serde(default)]
    pub dynamic_antagonist: Option<Vec<String>>,
}

/// Reasoning behind an A-line ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ALineReasoning {
    /// Number of scenes the thread spans
    pub scene_count: u32,
    /// Fraction of the thread's scenes carrying setup/payoff links
    pub setup_payoff_density: f64,
    /// Whether the thread drives the climax
    pub drives_climax: bool,
}

/// The primary (A-line) thread ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ALineRanking {
    /// Ranked thread id
    pub tcc_id: String,
    /// The thread's super-objective
    pub super_objective: String,
    /// Spine score (structural weight)
    pub spine_score: f64,
    /// Ranking reasoning
    pub reasoning: ALineReasoning,
    /// Force dynamics
    pub forces: Forces,
}

/// Reasoning behind a B-line ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BLineReasoning {
    /// Emotional intensity in [0, 1]
    pub emotional_intensity: f64,
    /// Interaction with the A-line in [0.3, 1]
    pub a_line_interaction: f64,
    /// Whether the thread carries internal conflict
    pub internal_conflict: bool,
}

/// A secondary (B-line) thread ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BLineRanking {
    /// Ranked thread id
    pub tcc_id: String,
    /// The thread's super-objective
    pub super_objective: String,
    /// Heart score (emotional weight)
    pub heart_score: f64,
    /// Ranking reasoning
    pub reasoning: BLineReasoning,
    /// Force dynamics
    pub forces: Forces,
}

/// Reasoning behind a C-line ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CLineReasoning {
    /// Thematic relevance in [0, 1]
    pub thematic_relevance: f64,
    /// Whether the thread could be cut without structural damage
    pub removable: bool,
}

/// A minor (C-line) thread ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CLineRanking {
    /// Ranked thread id
    pub tcc_id: String,
    /// The thread's super-objective
    pub super_objective: String,
    /// Flavor score (texture weight)
    pub flavor_score: f64,
    /// Ranking reasoning
    pub reasoning: CLineReasoning,
    /// Force dynamics
    pub forces: Forces,
}

/// All thread rankings: exactly one A-line, up to two B-lines, any
/// number of C-lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    /// The primary thread
    pub a_line: ALineRanking,
    /// Secondary threads (at most 2)
    #[serde(default)]
    pub b_lines: Vec<BLineRanking>,
    /// Minor threads
    #[serde(default)]
    pub c_lines: Vec<CLineRanking>,
}

/// Coverage metrics from auditor analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditorMetrics {
    /// Total scenes in the script
    pub total_scenes: u32,
    /// Fraction of scenes covered by the A-line
    pub a_line_coverage: f64,
    /// Fraction of scenes covered by B-lines
    pub b_line_coverage: f64,
    /// Fraction of scenes covered by C-lines
    pub c_line_coverage: f64,
}

/// Output from Stage 2: Auditor. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditorOutput {
    /// Thread rankings
    pub rankings: Rankings,
    /// Coverage metrics
    pub metrics: AuditorMetrics,
}
