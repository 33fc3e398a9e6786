//! Database connection utilities.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use dramaturge_error::{DatabaseError, DatabaseErrorKind, DramaturgeResult};

/// Establish a connection to the PostgreSQL database.
///
/// Loads `.env` if present, then reads `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error when `DATABASE_URL` is unset or the connection
/// fails.
pub fn establish_connection() -> DramaturgeResult<PgConnection> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        DatabaseError::new(DatabaseErrorKind::Connection(
            "DATABASE_URL environment variable not set".to_string(),
        ))
    })?;

    let conn = PgConnection::establish(&database_url)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
    Ok(conn)
}

/// Create the cache tables when they don't exist yet.
///
/// The unique key over (content_hash, provider, model) backs the
/// upsert; the counters table holds a single row.
pub fn init_schema(conn: &mut PgConnection) -> DramaturgeResult<()> {
    diesel::sql_query(
        "CREATE TABLE IF NOT EXISTS analysis_cache (
            id SERIAL PRIMARY KEY,
            content_hash TEXT NOT NULL,
            script_name TEXT NOT NULL,
            provider TEXT NOT NULL,
            model TEXT NOT NULL,
            parsed_script TEXT,
            stage1_result TEXT,
            stage2_result TEXT,
            stage3_result TEXT,
            scene_count INTEGER,
            tcc_count INTEGER,
            processing_time DOUBLE PRECISION,
            api_calls INTEGER,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP,
            expires_at TIMESTAMPTZ,
            UNIQUE (content_hash, provider, model)
        )",
    )
    .execute(conn)
    .map_err(DatabaseError::from)?;

    diesel::sql_query(
        "CREATE INDEX IF NOT EXISTS idx_analysis_cache_hash
         ON analysis_cache (content_hash)",
    )
    .execute(conn)
    .map_err(DatabaseError::from)?;

    diesel::sql_query(
        "CREATE TABLE IF NOT EXISTS cache_stats (
            id SERIAL PRIMARY KEY,
            total_hits BIGINT NOT NULL DEFAULT 0,
            total_misses BIGINT NOT NULL DEFAULT 0
        )",
    )
    .execute(conn)
    .map_err(DatabaseError::from)?;

    diesel::sql_query(
        "INSERT INTO cache_stats (id, total_hits, total_misses)
         VALUES (1, 0, 0)
         ON CONFLICT (id) DO NOTHING",
    )
    .execute(conn)
    .map_err(DatabaseError::from)?;

    tracing::info!("Analysis cache schema ready");
    Ok(())
}
