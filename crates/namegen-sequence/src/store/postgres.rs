use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::runtime::{Builder, Runtime};
use tracing::info;

use super::{SequenceStore, check_count};
use crate::errors::SequenceResult;
use crate::key::SequenceKey;

const TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS namegen_sequence (
    scope TEXT NOT NULL,
    name TEXT NOT NULL,
    sub_id BIGINT NOT NULL DEFAULT 0,
    value BIGINT NOT NULL,
    floor BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (scope, name, sub_id)
)";

const FLOOR_COLUMN_DDL: &str =
    "ALTER TABLE namegen_sequence ADD COLUMN IF NOT EXISTS floor BIGINT NOT NULL DEFAULT 0";

const RESERVE_SQL: &str = "INSERT INTO namegen_sequence AS seq (scope, name, sub_id, value)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (scope, name, sub_id) DO UPDATE SET value = seq.value + EXCLUDED.value
    RETURNING value";

const ENSURE_MINIMUM_SQL: &str = "INSERT INTO namegen_sequence AS seq (scope, name, sub_id, value, floor)
    VALUES ($1, $2, $3, $4, $4)
    ON CONFLICT (scope, name, sub_id) DO UPDATE SET
        value = GREATEST(seq.value, EXCLUDED.value),
        floor = GREATEST(seq.floor, EXCLUDED.floor)
    RETURNING value";

const CURRENT_SQL: &str =
    "SELECT value FROM namegen_sequence WHERE scope = $1 AND name = $2 AND sub_id = $3";

const RELEASE_SQL: &str = "UPDATE namegen_sequence SET value = GREATEST($4, floor)
    WHERE scope = $1 AND name = $2 AND sub_id = $3 AND value = $5 AND GREATEST($4, floor) < $5";

/// Cluster-wide store backed by a Postgres table.
///
/// Every operation is a single statement, so concurrent processes never hand
/// out the same range. The synchronous API drives a private current-thread
/// runtime and must not be called from inside another Tokio runtime.
pub struct PgSequenceStore {
    runtime: Runtime,
    pool: PgPool,
    description: String,
}

impl PgSequenceStore {
    /// Connect and create the backing table when missing.
    ///
    /// `description` is what gets logged in place of the connection string.
    pub fn connect(database_url: &str, description: impl Into<String>) -> SequenceResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let pool = runtime.block_on(async {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
                .connect(database_url)
                .await?;
            sqlx::query(TABLE_DDL).execute(&pool).await?;
            sqlx::query(FLOOR_COLUMN_DDL).execute(&pool).await?;
            Ok::<_, sqlx::Error>(pool)
        })?;
        let description = description.into();
        info!(store = %description, "connected postgres sequence store");
        Ok(Self {
            runtime,
            pool,
            description,
        })
    }
}

impl SequenceStore for PgSequenceStore {
    fn reserve(&self, key: &SequenceKey, count: i64) -> SequenceResult<i64> {
        check_count(count)?;
        let end: i64 = self.runtime.block_on(
            sqlx::query_scalar(RESERVE_SQL)
                .bind(&key.scope)
                .bind(&key.name)
                .bind(key.sub_id)
                .bind(count)
                .fetch_one(&self.pool),
        )?;
        Ok(end - count + 1)
    }

    fn ensure_minimum(&self, key: &SequenceKey, floor: i64) -> SequenceResult<i64> {
        let value: i64 = self.runtime.block_on(
            sqlx::query_scalar(ENSURE_MINIMUM_SQL)
                .bind(&key.scope)
                .bind(&key.name)
                .bind(key.sub_id)
                .bind(floor)
                .fetch_one(&self.pool),
        )?;
        Ok(value)
    }

    fn current(&self, key: &SequenceKey) -> SequenceResult<i64> {
        let value: Option<i64> = self.runtime.block_on(
            sqlx::query_scalar(CURRENT_SQL)
                .bind(&key.scope)
                .bind(&key.name)
                .bind(key.sub_id)
                .fetch_optional(&self.pool),
        )?;
        Ok(value.unwrap_or(0))
    }

    fn release(
        &self,
        key: &SequenceKey,
        reserved_end: i64,
        last_used: i64,
    ) -> SequenceResult<bool> {
        let result = self.runtime.block_on(
            sqlx::query(RELEASE_SQL)
                .bind(&key.scope)
                .bind(&key.name)
                .bind(key.sub_id)
                .bind(last_used)
                .bind(reserved_end)
                .execute(&self.pool),
        )?;
        Ok(result.rows_affected() == 1)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

impl std::fmt::Debug for PgSequenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSequenceStore")
            .field("store", &self.description)
            .finish()
    }
}
