//! Stage 3 (Modifier) input/output schema: structural defects and fixes.

use crate::Script;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Severity of a detected structural defect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Breaks narrative causality
    #[display("high")]
    High,
    /// Weakens narrative causality
    #[display("medium")]
    Medium,
    /// Cosmetic inconsistency
    #[display("low")]
    Low,
}

/// Category of a detected structural defect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// A one-directional setup/payoff link
    #[display("broken_setup_payoff")]
    BrokenSetupPayoff,
    /// A scene missing an expected information change
    #[display("missing_info_change")]
    MissingInfoChange,
    /// A relationship change missing a participant or state
    #[display("incomplete_relation_change")]
    IncompleteRelationChange,
    /// A referenced key object never introduced
    #[display("missing_key_object")]
    MissingKeyObject,
}

/// Canonical repair actions the Modifier may apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum FixAction {
    /// Add the missing payoff reference
    #[display("add_payoff_reference")]
    AddPayoffReference,
    /// Add a missing information change
    #[display("add_info_change")]
    AddInfoChange,
    /// Add a missing relationship change
    #[display("add_relation_change")]
    AddRelationChange,
    /// Add a missing key object
    #[display("add_key_object")]
    AddKeyObject,
    /// Repair a consistency defect in place
    #[display("fix_consistency")]
    FixConsistency,
}

/// A suggested fix attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedFix {
    /// Repair action
    pub action: FixAction,
    /// Scene to modify
    pub target_scene: String,
    /// Field path within the scene
    pub field: String,
    /// New value for the field
    pub value: JsonValue,
}

/// A deterministically-detected structural defect fed to Stage 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue identifier (`ISS_NNN`)
    pub issue_id: String,
    /// Defect severity
    pub severity: Severity,
    /// Defect category
    pub category: IssueCategory,
    /// Human-readable description
    pub description: String,
    /// Scene ids involved
    pub affected_scenes: Vec<String>,
    /// Suggested repair
    pub suggested_fix: SuggestedFix,
}

/// Audit report with identified issues, the Modifier's input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditReport {
    /// Detected issues
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// The kind of change applied while fixing an issue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ModificationAction {
    /// A value was added
    #[display("add")]
    Add,
    /// A value was appended to a list
    #[display("append")]
    Append,
    /// A value was updated in place (also the no-op action)
    #[display("update")]
    Update,
    /// A value was removed
    #[display("remove")]
    Remove,
    /// A record was deleted
    #[display("delete")]
    Delete,
}

/// One record of whether an issue was applied or skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationLogEntry {
    /// The issue this entry refers to
    pub issue_id: String,
    /// Whether the fix was applied
    pub applied: bool,
    /// Scene that was modified
    #[serde(default)]
    pub scene_id: Option<String>,
    /// Field that was modified
    #[serde(default)]
    pub field: Option<String>,
    /// The kind of change applied
    #[serde(default)]
    pub change_type: Option<ModificationAction>,
    /// Value before the change
    #[serde(default)]
    pub old_value: Option<JsonValue>,
    /// Value after the change
    #[serde(default)]
    pub new_value: Option<JsonValue>,
    /// Reason the issue was skipped or handled differently
    #[serde(default)]
    pub reason: Option<String>,
}

/// Fix accounting for a Modifier run.
///
/// Invariant: `fixed + skipped == total_issues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationValidation {
    /// Total issues presented to the Modifier
    pub total_issues: u32,
    /// Issues fixed
    pub fixed: u32,
    /// Issues skipped
    pub skipped: u32,
    /// New issues introduced while fixing
    pub new_issues_introduced: u32,
}

/// Output from Stage 3: Modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierOutput {
    /// The repaired script copy
    pub modified_script: Script,
    /// Per-issue modification log
    pub modification_log: Vec<ModificationLogEntry>,
    /// Fix accounting
    pub validation: ModificationValidation,
}

impl ModifierOutput {
    /// Synthesize a zero-count output for scripts with no detected
    /// issues, without any model involvement.
    pub fn empty(script: Script) -> Self {
        Self {
            modified_script: script,
            modification_log: Vec::new(),
            validation: ModificationValidation {
                total_issues: 0,
                fixed: 0,
                skipped: 0,
                new_issues_introduced: 0,
            },
        }
    }
}
