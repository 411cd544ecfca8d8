// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Quota Store trait
//!
//! Durable storage for per-user, per-period usage counters. The store is
//! the exclusive owner of persisted records; the gate is its only caller.
//! The conditional increment is the single mutating entry point so a
//! check-then-increment race between concurrent requests cannot overshoot
//! the ceiling.

use async_trait::async_trait;

/// Errors surfaced by a quota store backend.
#[derive(Debug, thiserror::Error)]
pub enum QuotaStoreError {
    /// The backing storage could not be reached or answered abnormally.
    /// Callers decide fail-open vs fail-closed; consumption fails closed.
    #[error("quota storage unavailable: {0}")]
    Unavailable(String),
}

/// Result of a conditional increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementOutcome {
    /// Whether the increment was applied.
    pub accepted: bool,
    /// The stored count after the operation (unchanged when rejected).
    pub new_count: u32,
}

/// Storage backend for usage counters keyed by (`user_key`, `period_key`).
///
/// Implementations must make `increment_if_under_limit` atomic with
/// respect to concurrent calls for the same key pair. For backends shared
/// by multiple service processes that atomicity must come from the storage
/// layer itself, not an in-process lock.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Current count for a user in a period. Absence of a record means
    /// zero usage, never an error.
    async fn get(&self, user_key: &str, period_key: &str) -> Result<u32, QuotaStoreError>;

    /// Atomically increment the counter iff it is currently below `limit`.
    ///
    /// Creates the record at zero on first touch. When the counter is at
    /// or above `limit` nothing is written and `accepted` is false.
    async fn increment_if_under_limit(
        &self,
        user_key: &str,
        period_key: &str,
        limit: u32,
    ) -> Result<IncrementOutcome, QuotaStoreError>;

    /// Remove records for periods strictly before `period_key`, returning
    /// how many were deleted. Storage hygiene only; correctness never
    /// depends on pruning.
    async fn prune_periods_before(&self, period_key: &str) -> Result<u64, QuotaStoreError>;
}
