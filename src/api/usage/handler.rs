// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Usage endpoint handlers
//!
//! Identity arrives in headers set by the upstream auth layer; this
//! service never authenticates users itself. The web layer is expected
//! to call GET /v1/usage before paying for a generation and POST
//! /v1/usage/consume only after the generation succeeded.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::{debug, warn};

use super::response::{ConsumeResponse, UsageResponse};
use crate::api::errors::ApiError;
use crate::api::server::AppState;

/// Header carrying the stable user identity (verified email or account
/// id), injected by the auth layer.
pub const USER_KEY_HEADER: &str = "x-user-key";

/// Optional header carrying the user's plan tier.
pub const USER_TIER_HEADER: &str = "x-user-tier";

fn identity_from_headers(headers: &HeaderMap) -> Result<(String, Option<String>), ApiError> {
    let user_key = headers
        .get(USER_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingIdentity)?
        .to_string();

    let tier = headers
        .get(USER_TIER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Ok((user_key, tier))
}

/// GET /v1/usage - Snapshot the caller's quota standing
///
/// Pure read; the dashboard polls this to render "N of LIMIT remaining
/// today". A storage outage is surfaced as 503, never as unlimited.
pub async fn usage_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsageResponse>, ApiError> {
    let (user_key, tier) = identity_from_headers(&headers)?;
    debug!("Usage check for {} (tier: {:?})", user_key, tier);

    let snapshot = state.gate.check_remaining(&user_key, tier.as_deref()).await?;
    Ok(Json(UsageResponse::from(snapshot)))
}

/// POST /v1/usage/consume - Charge one generation unit
///
/// Returns 429 with the reset instant when the caller is already at the
/// ceiling, and 503 when storage is unreachable; in both cases nothing
/// was charged and no grant is held.
pub async fn consume_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ConsumeResponse>, ApiError> {
    let (user_key, tier) = identity_from_headers(&headers)?;

    let outcome = state.gate.consume_one(&user_key, tier.as_deref()).await?;
    if !outcome.accepted {
        warn!(
            "Consume rejected for {}: {}/{} used",
            user_key, outcome.used, outcome.limit
        );
        return Err(ApiError::LimitReached {
            used: outcome.used,
            limit: outcome.limit,
            resets_at: outcome.resets_at,
        });
    }

    Ok(Json(ConsumeResponse::from(outcome)))
}
