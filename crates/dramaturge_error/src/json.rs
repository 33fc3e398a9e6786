//! Errors for model-output and cache-payload JSON handling.

/// A stage completion or cache payload that could not be parsed or
/// serialized, with the source location of the failed call.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} at line {} in {}", message, line, file)]
pub struct JsonError {
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Create a new JsonError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use dramaturge_error::JsonError;
    ///
    /// let err = JsonError::new("Discoverer output is not valid JSON: expected value at line 1");
    /// assert!(err.message.contains("not valid JSON"));
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
