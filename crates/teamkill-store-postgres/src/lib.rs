//! PostgreSQL implementation of the teamkill counter store.
//!
//! This crate provides a [`CounterStore`] backed by a single table, for
//! deployments that already run Postgres and want the counts off local disk.
//!
//! # Features
//!
//! - One row per tracked user
//! - Every mutation runs in its own transaction under an `EXCLUSIVE` table
//!   lock, so mutations are serialized across every bot process sharing the
//!   database
//! - `CHECK (count >= 0)` as a second guard against negative counts
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE team_kills (
//!     user_id TEXT PRIMARY KEY,
//!     display_name TEXT NOT NULL,
//!     count BIGINT NOT NULL DEFAULT 0 CHECK (count >= 0),
//!
//!     -- Timestamps
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE INDEX idx_team_kills_leaderboard ON team_kills (count DESC, user_id)
//!     WHERE count > 0;
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use teamkill_store_postgres::PgCounterStore;
//! use sqlx::PgPool;
//!
//! let pool = PgPool::connect("postgres://localhost/mydb").await?;
//! let store = PgCounterStore::new(pool);
//! store.migrate().await?;
//!
//! let dispatcher = CommandDispatcher::new(Arc::new(store), config.policy());
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use teamkill_core::{CounterRecord, CounterStore, Delta, StoreError};

/// PostgreSQL counter store implementation.
#[derive(Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    /// Create a new PostgreSQL counter store.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the table and index if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS team_kills (
                user_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                count BIGINT NOT NULL DEFAULT 0 CHECK (count >= 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_team_kills_leaderboard
                ON team_kills (count DESC, user_id)
                WHERE count > 0
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(())
    }

    /// Begin a transaction holding the table-wide write lock.
    ///
    /// `EXCLUSIVE` blocks other writers but not plain `SELECT`s.
    async fn begin_exclusive(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        sqlx::query("LOCK TABLE team_kills IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;
        Ok(tx)
    }
}

fn to_count(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(StoreError::backend)
}

#[async_trait]
impl CounterStore for PgCounterStore {
    /// Apply a delta inside one locked transaction.
    ///
    /// A rejected decrement rolls the transaction back without writing.
    async fn apply_delta(
        &self,
        user_id: &str,
        display_name: &str,
        delta: Delta,
    ) -> Result<u64, StoreError> {
        let mut tx = self.begin_exclusive().await?;

        let count: i64 = match delta {
            Delta::Increment => sqlx::query(
                r#"
                INSERT INTO team_kills (user_id, display_name, count)
                VALUES ($1, $2, 1)
                ON CONFLICT (user_id) DO UPDATE
                SET count = team_kills.count + 1,
                    display_name = EXCLUDED.display_name,
                    updated_at = NOW()
                RETURNING count
                "#,
            )
            .bind(user_id)
            .bind(display_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::backend)?
            .get("count"),
            Delta::Decrement => {
                let row = sqlx::query(
                    r#"
                    UPDATE team_kills
                    SET count = count - 1,
                        display_name = $2,
                        updated_at = NOW()
                    WHERE user_id = $1 AND count > 0
                    RETURNING count
                    "#,
                )
                .bind(user_id)
                .bind(display_name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StoreError::backend)?;

                match row {
                    Some(row) => row.get("count"),
                    None => {
                        let tracked: bool = sqlx::query_scalar(
                            "SELECT EXISTS (SELECT 1 FROM team_kills WHERE user_id = $1)",
                        )
                        .bind(user_id)
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(StoreError::backend)?;
                        tx.rollback().await.map_err(StoreError::backend)?;
                        return Err(StoreError::NothingToSubtract {
                            user_id: user_id.to_owned(),
                            tracked,
                        });
                    }
                }
            }
        };

        tx.commit().await.map_err(StoreError::backend)?;
        to_count(count)
    }

    async fn snapshot(&self) -> Result<Vec<CounterRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, display_name, count
            FROM team_kills
            WHERE count > 0
            ORDER BY count DESC, user_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        rows.into_iter()
            .map(|row| {
                Ok(CounterRecord {
                    user_id: row.get("user_id"),
                    display_name: row.get("display_name"),
                    count: to_count(row.get("count"))?,
                })
            })
            .collect()
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        let mut tx = self.begin_exclusive().await?;

        let result = sqlx::query("DELETE FROM team_kills")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;

        tx.commit().await.map_err(StoreError::backend)?;
        tracing::info!(removed = result.rows_affected(), "team_kills cleared");
        Ok(())
    }
}

/// Utility functions for operators.
impl PgCounterStore {
    /// Number of tracked users, including those at zero.
    pub async fn tracked_users(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS tracked FROM team_kills")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.get("tracked"))
    }
}
