//! Content-addressed result caching for the Dramaturge script
//! analysis engine.
//!
//! A completed three-stage analysis is keyed by the SHA-256 of the
//! exact script content together with the provider and model that
//! produced it. The memoization layer gates lookups on completeness,
//! keeps persisted hit/miss counters, and stamps a 90-day expiry on
//! writes; any [`CacheRepository`](dramaturge_interface::CacheRepository)
//! implementation can back it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod hash;
mod in_memory;
mod result_cache;

pub use hash::content_hash;
pub use in_memory::InMemoryCacheStore;
pub use result_cache::{AnalysisResult, CachedAnalyzer, ResultCache};
