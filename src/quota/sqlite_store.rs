// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! SQLite Quota Store
//!
//! Durable storage for usage counters. The conditional increment is a
//! single `UPDATE ... WHERE used < ? RETURNING used`, so atomicity comes
//! from the database and the store can be shared by any number of
//! stateless service processes pointed at the same file.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::store::{IncrementOutcome, QuotaStore, QuotaStoreError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS usage_counters (
    user_key   TEXT NOT NULL,
    period_key TEXT NOT NULL,
    used       INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_key, period_key)
)";

/// SQLite-backed storage for usage counters
#[derive(Clone)]
pub struct SqliteQuotaStore {
    pool: SqlitePool,
}

impl SqliteQuotaStore {
    /// Open (or create) the database at `path` and ensure the schema.
    pub async fn connect(path: &Path) -> Result<Self, QuotaStoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("💾 SQLite quota store ready at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database. Test helper; a single connection keeps
    /// every query on the same database instance.
    pub async fn in_memory() -> Result<Self, QuotaStoreError> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), QuotaStoreError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    /// Close the underlying pool, flushing outstanding writes.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QuotaStore for SqliteQuotaStore {
    async fn get(&self, user_key: &str, period_key: &str) -> Result<u32, QuotaStoreError> {
        let row = sqlx::query(
            "SELECT used FROM usage_counters WHERE user_key = ? AND period_key = ?",
        )
        .bind(user_key)
        .bind(period_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;

        match row {
            Some(row) => {
                let used: i64 = row
                    .try_get("used")
                    .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;
                Ok(used.max(0) as u32)
            }
            None => Ok(0),
        }
    }

    async fn increment_if_under_limit(
        &self,
        user_key: &str,
        period_key: &str,
        limit: u32,
    ) -> Result<IncrementOutcome, QuotaStoreError> {
        // First touch creates the record at zero.
        sqlx::query(
            "INSERT INTO usage_counters (user_key, period_key, used) VALUES (?, ?, 0)
             ON CONFLICT (user_key, period_key) DO NOTHING",
        )
        .bind(user_key)
        .bind(period_key)
        .execute(&self.pool)
        .await
        .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;

        // Conditional increment; the WHERE clause is the gate condition,
        // evaluated atomically by the database.
        let row = sqlx::query(
            "UPDATE usage_counters SET used = used + 1
             WHERE user_key = ? AND period_key = ? AND used < ?
             RETURNING used",
        )
        .bind(user_key)
        .bind(period_key)
        .bind(limit as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;

        match row {
            Some(row) => {
                let used: i64 = row
                    .try_get("used")
                    .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;
                debug!(
                    "📥 Usage counter incremented for {} in {} ({}/{})",
                    user_key, period_key, used, limit
                );
                Ok(IncrementOutcome {
                    accepted: true,
                    new_count: used.max(0) as u32,
                })
            }
            None => {
                let current = self.get(user_key, period_key).await?;
                debug!(
                    "⛔ Usage counter at ceiling for {} in {} ({}/{})",
                    user_key, period_key, current, limit
                );
                Ok(IncrementOutcome {
                    accepted: false,
                    new_count: current,
                })
            }
        }
    }

    async fn prune_periods_before(&self, period_key: &str) -> Result<u64, QuotaStoreError> {
        let result = sqlx::query("DELETE FROM usage_counters WHERE period_key < ?")
            .bind(period_key)
            .execute(&self.pool)
            .await
            .map_err(|e| QuotaStoreError::Unavailable(e.to_string()))?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!("🗑️ Pruned {} usage records before {}", removed, period_key);
        }
        Ok(removed)
    }
}
