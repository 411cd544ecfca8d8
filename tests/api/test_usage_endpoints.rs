// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Tests for GET /v1/usage and POST /v1/usage/consume

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::util::ServiceExt;

use styleai_quota::api::{ApiConfig, AppState, ErrorResponse, USER_KEY_HEADER, USER_TIER_HEADER};
use styleai_quota::api::{ConsumeResponse, UsageResponse};
use styleai_quota::quota::{
    DayBoundaryPolicy, IncrementOutcome, LimitPolicy, MemoryQuotaStore, QuotaGate, QuotaStore,
    QuotaStoreError,
};
use styleai_quota::ApiServer;

fn test_router_with_limits(limits: LimitPolicy) -> Router {
    let store = Arc::new(MemoryQuotaStore::new());
    let gate = Arc::new(QuotaGate::new(store, DayBoundaryPolicy::utc(), limits));
    ApiServer::create_router(AppState { gate }, &ApiConfig::default())
}

fn test_router() -> Router {
    test_router_with_limits(LimitPolicy::default())
}

fn get_usage(user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/v1/usage");
    if let Some(user) = user {
        builder = builder.header(USER_KEY_HEADER, user);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_consume(user: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/usage/consume")
        .header(USER_KEY_HEADER, user)
        .body(Body::empty())
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_ok() {
    let router = test_router();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_usage_requires_identity() {
    let router = test_router();
    let response = router.oneshot(get_usage(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: ErrorResponse = json_body(response).await;
    assert_eq!(body.error_type, "unauthorized");
    assert!(body.request_id.is_some());
}

#[tokio::test]
async fn test_fresh_user_sees_full_quota() {
    let router = test_router();
    let response = router
        .oneshot(get_usage(Some("bob@example.com")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: UsageResponse = json_body(response).await;
    assert_eq!(body.used, 0);
    assert_eq!(body.limit, 3);
    assert_eq!(body.remaining, 3);
}

#[tokio::test]
async fn test_usage_payload_uses_camel_case() {
    let router = test_router();
    let response = router
        .oneshot(get_usage(Some("bob@example.com")))
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(raw.get("periodKey").is_some());
    assert!(raw.get("resetsAt").is_some());
    assert!(raw.get("period_key").is_none());
}

#[tokio::test]
async fn test_consume_until_exhaustion() {
    let router = test_router();

    for expected in 1..=3u32 {
        let response = router
            .clone()
            .oneshot(post_consume("alice@example.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: ConsumeResponse = json_body(response).await;
        assert!(body.accepted);
        assert_eq!(body.used, expected);
        assert_eq!(body.remaining, 3 - expected);
    }

    // Fourth call: 429 with the concrete standing and reset instant.
    let response = router
        .clone()
        .oneshot(post_consume("alice@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let body: ErrorResponse = json_body(response).await;
    assert_eq!(body.error_type, "limit_reached");
    let details = body.details.unwrap();
    assert_eq!(details["remaining"], serde_json::json!(0));
    assert_eq!(details["used"], serde_json::json!(3));
    assert!(details.contains_key("resetsAt"));

    // The rejected call charged nothing.
    let response = router
        .oneshot(get_usage(Some("alice@example.com")))
        .await
        .unwrap();
    let body: UsageResponse = json_body(response).await;
    assert_eq!(body.used, 3);
}

#[tokio::test]
async fn test_tier_header_raises_the_ceiling() {
    let router = test_router_with_limits(LimitPolicy::default().with_tier("business", 20));
    let request = Request::builder()
        .method("GET")
        .uri("/v1/usage")
        .header(USER_KEY_HEADER, "carol@example.com")
        .header(USER_TIER_HEADER, "business")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let body: UsageResponse = json_body(response).await;
    assert_eq!(body.limit, 20);
    assert_eq!(body.remaining, 20);
}

/// Store stub standing in for an unreachable backend.
struct FailingStore;

#[async_trait]
impl QuotaStore for FailingStore {
    async fn get(&self, _user_key: &str, _period_key: &str) -> Result<u32, QuotaStoreError> {
        Err(QuotaStoreError::Unavailable("backend offline".to_string()))
    }

    async fn increment_if_under_limit(
        &self,
        _user_key: &str,
        _period_key: &str,
        _limit: u32,
    ) -> Result<IncrementOutcome, QuotaStoreError> {
        Err(QuotaStoreError::Unavailable("backend offline".to_string()))
    }

    async fn prune_periods_before(&self, _period_key: &str) -> Result<u64, QuotaStoreError> {
        Err(QuotaStoreError::Unavailable("backend offline".to_string()))
    }
}

#[tokio::test]
async fn test_storage_outage_fails_closed() {
    let gate = Arc::new(QuotaGate::new(
        Arc::new(FailingStore),
        DayBoundaryPolicy::utc(),
        LimitPolicy::default(),
    ));
    let router = ApiServer::create_router(AppState { gate }, &ApiConfig::default());

    // Consumption during an outage grants nothing.
    let response = router
        .clone()
        .oneshot(post_consume("alice@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorResponse = json_body(response).await;
    assert_eq!(body.error_type, "storage_unavailable");

    // Reads surface the outage instead of defaulting to unlimited.
    let response = router
        .oneshot(get_usage(Some("alice@example.com")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
