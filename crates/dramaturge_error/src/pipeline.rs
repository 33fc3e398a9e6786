//! Pipeline error types for stage orchestration.

/// Specific error conditions for pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// A stage failed to produce usable output
    #[display("Stage '{}' failed: {}", stage, message)]
    StageFailed {
        /// Stage name
        stage: String,
        /// Failure description
        message: String,
    },
    /// The shared retry budget was exhausted
    #[display("Retry budget exhausted after {} attempts", _0)]
    RetriesExhausted(u32),
    /// A stage was entered before its predecessor produced output
    #[display("Stage '{}' requires output from a prior stage that is missing", _0)]
    MissingStageOutput(String),
    /// Failed to build a model request
    #[display("Failed to build model request: {}", _0)]
    RequestBuild(String),
    /// Serialization of stage input failed
    #[display("Serialization error: {}", _0)]
    Serialization(String),
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use dramaturge_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::RetriesExhausted(3));
/// assert!(format!("{}", err).contains("exhausted"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
