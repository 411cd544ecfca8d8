// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Usage API endpoint module
//!
//! Provides GET /v1/usage for quota display and POST /v1/usage/consume
//! for post-generation bookkeeping.

pub mod handler;
pub mod response;

pub use handler::{consume_handler, usage_handler, USER_KEY_HEADER, USER_TIER_HEADER};
pub use response::{ConsumeResponse, UsageResponse};
