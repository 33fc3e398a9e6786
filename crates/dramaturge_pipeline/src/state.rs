//! Pipeline state machine.
//!
//! Stage order is fixed: `Init -> Discover -> Audit -> Modify -> Done`,
//! with `Failed` as the absorbing error state. A single retry counter
//! is shared across all stages; a stage that fails re-enters itself
//! while the counter is below the cap and drops to `Failed` once the
//! budget is spent.

/// Shared retry budget across all stages of a run.
pub const RETRY_CAP: u32 = 3;

/// A pipeline stage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Run created, nothing executed yet
    #[display("init")]
    Init,
    /// Stage 1: conflict-thread discovery
    #[display("discover")]
    Discover,
    /// Stage 2: thread ranking
    #[display("audit")]
    Audit,
    /// Stage 3: structural correction
    #[display("modify")]
    Modify,
    /// All stages completed
    #[display("done")]
    Done,
    /// Retry budget exhausted; absorbing
    #[display("failed")]
    Failed,
}

impl Stage {
    /// Whether the machine has stopped.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

/// The result of executing one stage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage produced validated output
    Success,
    /// The stage failed in a retryable way (model error, bad output)
    RecoverableFailure,
}

/// The pure transition function.
///
/// `retry_count` is the shared counter as already incremented for the
/// failure being reported. Terminal states absorb every outcome.
///
/// # Examples
///
/// ```
/// use dramaturge_pipeline::{advance, Stage, StageOutcome, RETRY_CAP};
///
/// assert_eq!(advance(Stage::Init, StageOutcome::Success, 0), Stage::Discover);
/// assert_eq!(
///     advance(Stage::Audit, StageOutcome::RecoverableFailure, 1),
///     Stage::Audit
/// );
/// assert_eq!(
///     advance(Stage::Audit, StageOutcome::RecoverableFailure, RETRY_CAP),
///     Stage::Failed
/// );
/// ```
pub fn advance(current: Stage, outcome: StageOutcome, retry_count: u32) -> Stage {
    match (current, outcome) {
        (Stage::Done, _) => Stage::Done,
        (Stage::Failed, _) => Stage::Failed,
        (Stage::Init, StageOutcome::Success) => Stage::Discover,
        (Stage::Discover, StageOutcome::Success) => Stage::Audit,
        (Stage::Audit, StageOutcome::Success) => Stage::Modify,
        (Stage::Modify, StageOutcome::Success) => Stage::Done,
        (stage, StageOutcome::RecoverableFailure) => {
            if retry_count < RETRY_CAP {
                stage
            } else {
                Stage::Failed
            }
        }
    }
}
