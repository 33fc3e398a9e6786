//! Validation error types for stage output checking.

/// Specific validation failures, each identifying the offending field.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Identifier does not match the required pattern
    #[display("Field '{}' has value '{}' which does not match pattern {}", field, value, pattern)]
    Pattern {
        /// Field path
        field: String,
        /// Offending value
        value: String,
        /// Expected pattern
        pattern: &'static str,
    },
    /// String is shorter than the allowed minimum
    #[display("Field '{}' has length {} (minimum {})", field, len, min)]
    TooShort {
        /// Field path
        field: String,
        /// Observed length in characters
        len: usize,
        /// Minimum allowed length
        min: usize,
    },
    /// String is longer than the allowed maximum
    #[display("Field '{}' has length {} (maximum {})", field, len, max)]
    TooLong {
        /// Field path
        field: String,
        /// Observed length in characters
        len: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// Numeric value is outside the allowed range
    #[display("Field '{}' has value {} (allowed {}..={})", field, value, min, max)]
    Range {
        /// Field path
        field: String,
        /// Observed value
        value: f64,
        /// Minimum allowed value
        min: f64,
        /// Maximum allowed value
        max: f64,
    },
    /// Numeric value must be strictly positive
    #[display("Field '{}' has value {} (must be positive)", field, value)]
    NotPositive {
        /// Field path
        field: String,
        /// Observed value
        value: f64,
    },
    /// Collection has too few elements
    #[display("Field '{}' has {} elements (minimum {})", field, len, min)]
    TooFewElements {
        /// Field path
        field: String,
        /// Observed element count
        len: usize,
        /// Minimum allowed count
        min: usize,
    },
    /// Collection has too many elements
    #[display("Field '{}' has {} elements (maximum {})", field, len, max)]
    TooManyElements {
        /// Field path
        field: String,
        /// Observed element count
        len: usize,
        /// Maximum allowed count
        max: usize,
    },
    /// Identifiers within a collection are not unique
    #[display("Field '{}' contains duplicate ids: {:?}", field, duplicates)]
    DuplicateIds {
        /// Field path
        field: String,
        /// The duplicated identifiers
        duplicates: Vec<String>,
    },
    /// Modifier fix/skip counts do not sum to the issue total
    #[display("Fix counts don't match: {} fixed + {} skipped != {} total", fixed, skipped, total)]
    CountMismatch {
        /// Issues reported fixed
        fixed: u32,
        /// Issues reported skipped
        skipped: u32,
        /// Total issues reported
        total: u32,
    },
    /// Relation change does not name exactly two distinct participants
    #[display("Field '{}' must name exactly two distinct participants, got {:?}", field, chars)]
    RelationParticipants {
        /// Field path
        field: String,
        /// Observed participants
        chars: Vec<String>,
    },
    /// Output could not be deserialized into the stage schema
    #[display("Field '{}' failed to deserialize: {}", field, message)]
    Schema {
        /// Field path (or stage name when the whole payload is malformed)
        field: String,
        /// Deserializer message
        message: String,
    },
}

/// Validation error with source location tracking.
///
/// Raised when stage output violates the schema or a cross-field
/// invariant that tolerant coercion could not repair. The stage
/// executor treats this as a recoverable failure.
///
/// # Examples
///
/// ```
/// use dramaturge_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::CountMismatch {
///     fixed: 2,
///     skipped: 1,
///     total: 4,
/// });
/// assert!(format!("{}", err).contains("don't match"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The specific validation failure
    pub kind: ValidationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
