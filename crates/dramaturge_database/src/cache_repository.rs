//! PostgreSQL implementation of the cache store.

use crate::rows::{AnalysisCacheRow, NewAnalysisCacheRow};
use crate::schema::{analysis_cache, cache_stats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use dramaturge_error::{DatabaseError, DramaturgeResult};
use dramaturge_interface::{
    AnalysisCacheEntry, CacheFilter, CacheKey, CacheRepository, CacheStats,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

const DEFAULT_PAGE_SIZE: i64 = 50;

/// Cache store backed by PostgreSQL via Diesel.
///
/// The connection is wrapped in `Arc<Mutex>` for async access; counter
/// updates run as single atomic UPDATE statements so concurrent probes
/// cannot lose increments.
pub struct PostgresCacheStore {
    conn: Arc<Mutex<PgConnection>>,
}

impl PostgresCacheStore {
    /// Wrap an established connection.
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Share an existing wrapped connection.
    pub fn from_arc(conn: Arc<Mutex<PgConnection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheRepository for PostgresCacheStore {
    async fn get(&self, key: &CacheKey) -> DramaturgeResult<Option<AnalysisCacheEntry>> {
        use analysis_cache::dsl;
        let mut conn = self.conn.lock().await;
        let row: Option<AnalysisCacheRow> = dsl::analysis_cache
            .filter(dsl::content_hash.eq(&key.content_hash))
            .filter(dsl::provider.eq(&key.provider))
            .filter(dsl::model.eq(&key.model))
            .filter(
                dsl::expires_at
                    .is_null()
                    .or(dsl::expires_at.gt(Utc::now())),
            )
            .first(&mut *conn)
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(row.map(AnalysisCacheEntry::from))
    }

    async fn get_by_id(&self, id: i32) -> DramaturgeResult<Option<AnalysisCacheEntry>> {
        use analysis_cache::dsl;
        let mut conn = self.conn.lock().await;
        let row: Option<AnalysisCacheRow> = dsl::analysis_cache
            .filter(dsl::id.eq(id))
            .first(&mut *conn)
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(row.map(AnalysisCacheEntry::from))
    }

    async fn upsert(&self, entry: &AnalysisCacheEntry) -> DramaturgeResult<i32> {
        use analysis_cache::dsl;
        let mut conn = self.conn.lock().await;
        let new_row = NewAnalysisCacheRow::from(entry);
        let id = diesel::insert_into(dsl::analysis_cache)
            .values(&new_row)
            .on_conflict((dsl::content_hash, dsl::provider, dsl::model))
            .do_update()
            .set(&new_row)
            .returning(dsl::id)
            .get_result(&mut *conn)
            .map_err(DatabaseError::from)?;
        tracing::debug!(id, hash = %entry.content_hash, "Upserted cache row");
        Ok(id)
    }

    async fn delete(&self, id: i32) -> DramaturgeResult<bool> {
        use analysis_cache::dsl;
        let mut conn = self.conn.lock().await;
        let removed = diesel::delete(dsl::analysis_cache.filter(dsl::id.eq(id)))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(removed > 0)
    }

    async fn delete_by_hash(&self, content_hash: &str) -> DramaturgeResult<usize> {
        use analysis_cache::dsl;
        let mut conn = self.conn.lock().await;
        let removed =
            diesel::delete(dsl::analysis_cache.filter(dsl::content_hash.eq(content_hash)))
                .execute(&mut *conn)
                .map_err(DatabaseError::from)?;
        Ok(removed)
    }

    async fn list(&self, filter: &CacheFilter) -> DramaturgeResult<(Vec<AnalysisCacheEntry>, i64)> {
        use analysis_cache::dsl;
        let mut conn = self.conn.lock().await;

        fn apply<'a>(
            mut query: analysis_cache::BoxedQuery<'a, diesel::pg::Pg>,
            filter: &CacheFilter,
        ) -> analysis_cache::BoxedQuery<'a, diesel::pg::Pg> {
            use analysis_cache::dsl;
            if let Some(search) = &filter.search {
                query = query.filter(dsl::script_name.like(format!("%{search}%")));
            }
            if let Some(provider) = &filter.provider {
                query = query.filter(dsl::provider.eq(provider.clone()));
            }
            if let Some(model) = &filter.model {
                query = query.filter(dsl::model.eq(model.clone()));
            }
            query
        }

        let total: i64 = apply(dsl::analysis_cache.into_boxed(), filter)
            .count()
            .get_result(&mut *conn)
            .map_err(DatabaseError::from)?;

        let limit = if filter.limit > 0 {
            filter.limit
        } else {
            DEFAULT_PAGE_SIZE
        };
        let rows: Vec<AnalysisCacheRow> = apply(dsl::analysis_cache.into_boxed(), filter)
            .order(dsl::created_at.desc())
            .limit(limit)
            .offset(filter.offset.max(0))
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;

        Ok((rows.into_iter().map(AnalysisCacheEntry::from).collect(), total))
    }

    async fn cleanup_expired(&self) -> DramaturgeResult<usize> {
        use analysis_cache::dsl;
        let mut conn = self.conn.lock().await;
        let removed = diesel::delete(dsl::analysis_cache.filter(dsl::expires_at.lt(Utc::now())))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(removed)
    }

    async fn clear_all(&self) -> DramaturgeResult<usize> {
        let mut conn = self.conn.lock().await;
        let removed = diesel::delete(analysis_cache::dsl::analysis_cache)
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        diesel::update(cache_stats::dsl::cache_stats)
            .set((
                cache_stats::dsl::total_hits.eq(0i64),
                cache_stats::dsl::total_misses.eq(0i64),
            ))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(removed)
    }

    async fn record_hit(&self) -> DramaturgeResult<()> {
        use cache_stats::dsl;
        let mut conn = self.conn.lock().await;
        diesel::update(dsl::cache_stats)
            .set(dsl::total_hits.eq(dsl::total_hits + 1))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn record_miss(&self) -> DramaturgeResult<()> {
        use cache_stats::dsl;
        let mut conn = self.conn.lock().await;
        diesel::update(dsl::cache_stats)
            .set(dsl::total_misses.eq(dsl::total_misses + 1))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn stats(&self) -> DramaturgeResult<CacheStats> {
        use analysis_cache::dsl;
        let mut conn = self.conn.lock().await;

        let total_entries: i64 = dsl::analysis_cache
            .count()
            .get_result(&mut *conn)
            .map_err(DatabaseError::from)?;

        let (total_hits, total_misses): (i64, i64) = cache_stats::dsl::cache_stats
            .select((cache_stats::dsl::total_hits, cache_stats::dsl::total_misses))
            .first(&mut *conn)
            .optional()
            .map_err(DatabaseError::from)?
            .unwrap_or((0, 0));

        let oldest_entry: Option<DateTime<Utc>> = dsl::analysis_cache
            .select(diesel::dsl::min(dsl::created_at))
            .first(&mut *conn)
            .map_err(DatabaseError::from)?;
        let newest_entry: Option<DateTime<Utc>> = dsl::analysis_cache
            .select(diesel::dsl::max(dsl::created_at))
            .first(&mut *conn)
            .map_err(DatabaseError::from)?;

        let by_provider: Vec<(String, i64)> = dsl::analysis_cache
            .group_by(dsl::provider)
            .select((dsl::provider, count_star()))
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;
        let by_model: Vec<(String, i64)> = dsl::analysis_cache
            .group_by(dsl::model)
            .select((dsl::model, count_star()))
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;

        let probes = total_hits + total_misses;
        Ok(CacheStats {
            total_entries,
            total_hits,
            total_misses,
            hit_rate: if probes > 0 {
                total_hits as f64 / probes as f64
            } else {
                0.0
            },
            oldest_entry,
            newest_entry,
            entries_by_provider: by_provider.into_iter().collect::<HashMap<_, _>>(),
            entries_by_model: by_model.into_iter().collect::<HashMap<_, _>>(),
        })
    }
}
