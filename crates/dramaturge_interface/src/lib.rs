//! Trait definitions for the Dramaturge script analysis engine.
//!
//! This crate provides the seams between the core pipeline and its
//! external collaborators: the model boundary (`AnalysisDriver`) and
//! the cache store boundary (`CacheRepository`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod driver;

pub use cache::{AnalysisCacheEntry, CacheFilter, CacheKey, CacheRepository, CacheStats};
pub use driver::AnalysisDriver;
