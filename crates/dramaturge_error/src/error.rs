//! Top-level error wrapper types.

#[cfg(feature = "database")]
use crate::DatabaseError;
use crate::{BackendError, JsonError, PipelineError, ValidationError};

/// The foundation error enum for the Dramaturge workspace.
///
/// # Examples
///
/// ```
/// use dramaturge_error::{DramaturgeError, BackendError};
///
/// let backend_err = BackendError::new("Connection failed");
/// let err: DramaturgeError = backend_err.into();
/// assert!(format!("{}", err).contains("Backend Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum DramaturgeErrorKind {
    /// Model backend error
    #[from(BackendError)]
    Backend(BackendError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Stage output validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Pipeline orchestration error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
}

/// Dramaturge error with kind discrimination.
///
/// # Examples
///
/// ```
/// use dramaturge_error::{DramaturgeResult, JsonError};
///
/// fn might_fail() -> DramaturgeResult<()> {
///     Err(JsonError::new("unexpected trailing characters"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Dramaturge Error: {}", _0)]
pub struct DramaturgeError(Box<DramaturgeErrorKind>);

impl DramaturgeError {
    /// Create a new error from a kind.
    pub fn new(kind: DramaturgeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DramaturgeErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to DramaturgeErrorKind
impl<T> From<T> for DramaturgeError
where
    T: Into<DramaturgeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Dramaturge operations.
///
/// # Examples
///
/// ```
/// use dramaturge_error::{DramaturgeResult, BackendError};
///
/// fn call_model() -> DramaturgeResult<String> {
///     Err(BackendError::new("503 Service Unavailable"))?
/// }
/// ```
pub type DramaturgeResult<T> = std::result::Result<T, DramaturgeError>;
