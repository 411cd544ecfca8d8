// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod server;
pub mod usage;

pub use errors::{ApiError, ErrorResponse};
pub use server::{ApiConfig, ApiServer, AppState, HealthResponse};
pub use usage::{
    consume_handler, usage_handler, ConsumeResponse, UsageResponse, USER_KEY_HEADER,
    USER_TIER_HEADER,
};
