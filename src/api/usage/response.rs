// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Usage API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quota::{ConsumeOutcome, UsageSnapshot};

/// Response for GET /v1/usage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    /// Generations consumed in the current period
    pub used: u32,

    /// Ceiling for this user
    pub limit: u32,

    /// Generations still available today
    pub remaining: u32,

    /// Period the snapshot was computed against (YYYY-MM-DD)
    pub period_key: String,

    /// Instant the quota resets
    pub resets_at: DateTime<Utc>,
}

impl From<UsageSnapshot> for UsageResponse {
    fn from(snapshot: UsageSnapshot) -> Self {
        Self {
            used: snapshot.used,
            limit: snapshot.limit,
            remaining: snapshot.remaining,
            period_key: snapshot.period_key,
            resets_at: snapshot.resets_at,
        }
    }
}

/// Response for POST /v1/usage/consume
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeResponse {
    /// Whether a generation unit was charged
    pub accepted: bool,

    /// Generations consumed in the current period, including this one
    pub used: u32,

    /// Ceiling for this user
    pub limit: u32,

    /// Generations still available today
    pub remaining: u32,

    /// Period the unit was charged against (YYYY-MM-DD)
    pub period_key: String,

    /// Instant the quota resets
    pub resets_at: DateTime<Utc>,
}

impl From<ConsumeOutcome> for ConsumeResponse {
    fn from(outcome: ConsumeOutcome) -> Self {
        Self {
            accepted: outcome.accepted,
            used: outcome.used,
            limit: outcome.limit,
            remaining: outcome.remaining,
            period_key: outcome.period_key,
            resets_at: outcome.resets_at,
        }
    }
}
