//! PostgreSQL cache store for the Dramaturge script analysis engine.
//!
//! Persists completed analyses in an `analysis_cache` table keyed by
//! (content_hash, provider, model), with persisted hit/miss counters
//! in `cache_stats`. Implements the
//! [`CacheRepository`](dramaturge_interface::CacheRepository) boundary
//! so the memoization layer in `dramaturge_cache` can run against
//! either this store or the in-memory one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache_repository;
mod connection;
mod rows;

pub mod schema;

pub use cache_repository::PostgresCacheStore;
pub use connection::{establish_connection, init_schema};
pub use rows::{AnalysisCacheRow, NewAnalysisCacheRow};
