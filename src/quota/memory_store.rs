// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! In-Memory Quota Store
//!
//! Provides process-local storage for usage counters. Used in tests and
//! single-process deployments; counts do not survive a restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::store::{IncrementOutcome, QuotaStore, QuotaStoreError};

/// Statistics about in-memory counter activity
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreStats {
    pub tracked_records: usize,
    pub accepted: u64,
    pub rejected: u64,
}

/// In-memory storage for usage counters
///
/// All mutations go through one write lock, which makes the conditional
/// increment atomic within the process.
#[derive(Clone, Default)]
pub struct MemoryQuotaStore {
    records: Arc<RwLock<HashMap<(String, String), u32>>>,
    stats: Arc<RwLock<MemoryStoreStats>>,
}

impl MemoryQuotaStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of tracked (user, period) records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Clear all records
    pub async fn clear(&self) {
        info!("🧹 Clearing all usage counters");
        self.records.write().await.clear();

        let mut stats = self.stats.write().await;
        stats.tracked_records = 0;
    }

    /// Get store statistics
    pub async fn stats(&self) -> MemoryStoreStats {
        self.stats.read().await.clone()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn get(&self, user_key: &str, period_key: &str) -> Result<u32, QuotaStoreError> {
        let records = self.records.read().await;
        let count = records
            .get(&(user_key.to_string(), period_key.to_string()))
            .copied()
            .unwrap_or(0);
        Ok(count)
    }

    async fn increment_if_under_limit(
        &self,
        user_key: &str,
        period_key: &str,
        limit: u32,
    ) -> Result<IncrementOutcome, QuotaStoreError> {
        let mut records = self.records.write().await;
        let count = records
            .entry((user_key.to_string(), period_key.to_string()))
            .or_insert(0);

        let outcome = if *count < limit {
            *count += 1;
            debug!(
                "📥 Usage counter incremented for {} in {} ({}/{})",
                user_key, period_key, *count, limit
            );
            IncrementOutcome {
                accepted: true,
                new_count: *count,
            }
        } else {
            debug!(
                "⛔ Usage counter at ceiling for {} in {} ({}/{})",
                user_key, period_key, *count, limit
            );
            IncrementOutcome {
                accepted: false,
                new_count: *count,
            }
        };

        let tracked = records.len();
        drop(records);

        let mut stats = self.stats.write().await;
        stats.tracked_records = tracked;
        if outcome.accepted {
            stats.accepted += 1;
        } else {
            stats.rejected += 1;
        }

        Ok(outcome)
    }

    async fn prune_periods_before(&self, period_key: &str) -> Result<u64, QuotaStoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        // Period keys are YYYY-MM-DD, so lexicographic order is day order.
        records.retain(|(_, period), _| period.as_str() >= period_key);
        let removed = (before - records.len()) as u64;

        let tracked = records.len();
        drop(records);

        let mut stats = self.stats.write().await;
        stats.tracked_records = tracked;

        if removed > 0 {
            info!("🗑️ Pruned {} usage records before {}", removed, period_key);
        }
        Ok(removed)
    }
}
