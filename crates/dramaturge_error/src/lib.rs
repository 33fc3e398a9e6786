//! Error types for the Dramaturge script analysis engine.
//!
//! This crate provides the foundation error types used throughout the
//! Dramaturge workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use dramaturge_error::{DramaturgeResult, BackendError};
//!
//! fn call_model() -> DramaturgeResult<String> {
//!     Err(BackendError::new("Connection refused"))?
//! }
//!
//! match call_model() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
#[cfg(feature = "database")]
mod database;
mod error;
mod json;
mod pipeline;
mod validation;

pub use backend::BackendError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{DramaturgeError, DramaturgeErrorKind, DramaturgeResult};
pub use json::JsonError;
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};
