//! Errors raised by model backends.

/// A failed model call, with the source location of the failed request.
///
/// Drivers map transport and provider failures into this type; the
/// executor treats every backend error as retryable against the shared
/// retry budget.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Backend Error: {} at line {} in {}", message, line, file)]
pub struct BackendError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl BackendError {
    /// Create a new BackendError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use dramaturge_error::BackendError;
    ///
    /// let err = BackendError::new("deepseek: connection reset during generate");
    /// assert!(err.message.contains("connection reset"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
