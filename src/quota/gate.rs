// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Quota Gate
//!
//! The public contract route handlers use around the paid generation
//! call: `check_remaining` before paying for a generation, `consume_one`
//! after it succeeds.
//!
//! Admission fails closed: a storage error never yields a grant.
//! Bookkeeping fails open: a generation that already succeeded is not
//! retro-charged when the subsequent increment fails. The asymmetry is
//! intentional; do not collapse it into full fail-closed accounting
//! without revisiting the paid-usage cost guarantees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::period::DayBoundaryPolicy;
use super::store::{QuotaStore, QuotaStoreError};

/// Daily ceiling applied when no tier override matches.
pub const DEFAULT_DAILY_LIMIT: u32 = 3;

/// Longest user key the gate accepts.
pub const MAX_USER_KEY_LEN: usize = 256;

/// Errors surfaced by the quota gate.
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// Empty, blank, or oversized user identity. Upstream auth should
    /// make this impossible; treated as a programming error.
    #[error("invalid user key: {0}")]
    InvalidUserKey(String),

    /// The underlying quota store failed. No grant is held.
    #[error(transparent)]
    Storage(#[from] QuotaStoreError),
}

/// Ceiling configuration: one default, optionally overridden per user
/// class ("tier"). Unknown tiers fall back to the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitPolicy {
    pub default_limit: u32,
    #[serde(default)]
    pub tiers: HashMap<String, u32>,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_DAILY_LIMIT,
            tiers: HashMap::new(),
        }
    }
}

impl LimitPolicy {
    /// Uniform ceiling for every user.
    pub fn uniform(limit: u32) -> Self {
        Self {
            default_limit: limit,
            tiers: HashMap::new(),
        }
    }

    /// Add a per-tier override.
    pub fn with_tier(mut self, tier: impl Into<String>, limit: u32) -> Self {
        self.tiers.insert(tier.into(), limit);
        self
    }

    /// Resolve the ceiling for an optional tier label.
    pub fn limit_for(&self, tier: Option<&str>) -> u32 {
        tier.and_then(|t| self.tiers.get(t))
            .copied()
            .unwrap_or(self.default_limit)
    }
}

/// Read-only view of a user's quota standing, safe to poll for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub period_key: String,
    pub resets_at: DateTime<Utc>,
}

/// Result of charging one generation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeOutcome {
    pub accepted: bool,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub period_key: String,
    pub resets_at: DateTime<Utc>,
}

/// Admission control for daily generation quotas
pub struct QuotaGate {
    store: Arc<dyn QuotaStore>,
    boundary: DayBoundaryPolicy,
    limits: LimitPolicy,
}

impl QuotaGate {
    /// Create a gate over an injected store, boundary policy, and limits.
    pub fn new(store: Arc<dyn QuotaStore>, boundary: DayBoundaryPolicy, limits: LimitPolicy) -> Self {
        info!(
            "🚪 Quota gate ready (default limit {}, {} tier override(s))",
            limits.default_limit,
            limits.tiers.len()
        );
        Self {
            store,
            boundary,
            limits,
        }
    }

    /// The boundary policy this gate computes periods with.
    pub fn boundary(&self) -> DayBoundaryPolicy {
        self.boundary
    }

    /// Snapshot a user's standing for the current period. Pure read.
    pub async fn check_remaining(
        &self,
        user_key: &str,
        tier: Option<&str>,
    ) -> Result<UsageSnapshot, QuotaError> {
        self.check_remaining_at(user_key, tier, Utc::now()).await
    }

    /// Snapshot a user's standing as of a caller-supplied instant.
    pub async fn check_remaining_at(
        &self,
        user_key: &str,
        tier: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<UsageSnapshot, QuotaError> {
        let user_key = validate_user_key(user_key)?;
        let period_key = self.boundary.current_period_key(now);
        let limit = self.limits.limit_for(tier);

        let used = self.store.get(user_key, &period_key).await?;
        debug!(
            "🔍 Quota check for {} in {}: {}/{}",
            user_key, period_key, used, limit
        );

        Ok(UsageSnapshot {
            used,
            limit,
            remaining: limit.saturating_sub(used),
            period_key,
            resets_at: self.boundary.next_reset(now),
        })
    }

    /// Charge one generation unit for the current period.
    ///
    /// Returns `accepted = false` without mutating anything when the user
    /// is already at the ceiling. A storage error propagates as
    /// `QuotaError::Storage`: the caller holds no grant and must deny.
    pub async fn consume_one(
        &self,
        user_key: &str,
        tier: Option<&str>,
    ) -> Result<ConsumeOutcome, QuotaError> {
        self.consume_one_at(user_key, tier, Utc::now()).await
    }

    /// Charge one generation unit as of a caller-supplied instant.
    ///
    /// One period key is computed here and used for the entire call, so a
    /// midnight rollover mid-request cannot split the check and the write
    /// across two periods.
    pub async fn consume_one_at(
        &self,
        user_key: &str,
        tier: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, QuotaError> {
        let user_key = validate_user_key(user_key)?;
        let period_key = self.boundary.current_period_key(now);
        let limit = self.limits.limit_for(tier);

        let outcome = self
            .store
            .increment_if_under_limit(user_key, &period_key, limit)
            .await?;

        if outcome.accepted {
            info!(
                "✅ Generation unit consumed by {} ({}/{} in {})",
                user_key, outcome.new_count, limit, period_key
            );
        } else {
            warn!(
                "⛔ Daily limit reached for {} ({}/{} in {})",
                user_key, outcome.new_count, limit, period_key
            );
        }

        Ok(ConsumeOutcome {
            accepted: outcome.accepted,
            used: outcome.new_count,
            limit,
            remaining: limit.saturating_sub(outcome.new_count),
            period_key,
            resets_at: self.boundary.next_reset(now),
        })
    }
}

fn validate_user_key(user_key: &str) -> Result<&str, QuotaError> {
    if user_key.trim().is_empty() {
        return Err(QuotaError::InvalidUserKey(
            "user key must not be empty".to_string(),
        ));
    }
    if user_key.len() > MAX_USER_KEY_LEN {
        return Err(QuotaError::InvalidUserKey(format!(
            "user key exceeds {} bytes",
            MAX_USER_KEY_LEN
        )));
    }
    Ok(user_key)
}
