// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::quota::{QuotaError, QuotaStoreError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    MissingIdentity,
    LimitReached {
        used: u32,
        limit: u32,
        resets_at: DateTime<Utc>,
    },
    StorageUnavailable(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::MissingIdentity => (
                "unauthorized",
                "Missing or empty user identity".to_string(),
                None,
            ),
            ApiError::LimitReached {
                used,
                limit,
                resets_at,
            } => {
                let mut details = HashMap::new();
                details.insert("used".to_string(), serde_json::Value::Number((*used).into()));
                details.insert(
                    "limit".to_string(),
                    serde_json::Value::Number((*limit).into()),
                );
                details.insert("remaining".to_string(), serde_json::Value::Number(0.into()));
                details.insert(
                    "resetsAt".to_string(),
                    serde_json::Value::String(resets_at.to_rfc3339()),
                );
                (
                    "limit_reached",
                    format!(
                        "Daily generation limit reached ({}/{}); resets tomorrow",
                        used, limit
                    ),
                    Some(details),
                )
            }
            ApiError::StorageUnavailable(msg) => ("storage_unavailable", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::MissingIdentity => 401,
            ApiError::LimitReached { .. } => 429,
            ApiError::StorageUnavailable(_) => 503,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::InvalidUserKey(msg) => ApiError::InvalidRequest(msg),
            QuotaError::Storage(QuotaStoreError::Unavailable(msg)) => {
                ApiError::StorageUnavailable(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.to_response(Some(request_id));
        (status, Json(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::MissingIdentity => write!(f, "Missing or empty user identity"),
            ApiError::LimitReached { used, limit, .. } => {
                write!(f, "Daily generation limit reached ({}/{})", used, limit)
            }
            ApiError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
