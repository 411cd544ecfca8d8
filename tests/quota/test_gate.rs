// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Tests for the quota gate contract

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use styleai_quota::quota::{
    DayBoundaryPolicy, IncrementOutcome, LimitPolicy, MemoryQuotaStore, QuotaError, QuotaGate,
    QuotaStore, QuotaStoreError,
};

fn gate_with_memory_store() -> (QuotaGate, Arc<MemoryQuotaStore>) {
    let store = Arc::new(MemoryQuotaStore::new());
    let gate = QuotaGate::new(
        store.clone(),
        DayBoundaryPolicy::utc(),
        LimitPolicy::default(),
    );
    (gate, store)
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
async fn test_fresh_user_has_full_quota() {
    let (gate, _) = gate_with_memory_store();
    let snapshot = gate.check_remaining("bob", None).await.unwrap();
    assert_eq!(snapshot.used, 0);
    assert_eq!(snapshot.limit, 3);
    assert_eq!(snapshot.remaining, 3);
}

#[tokio::test]
async fn test_three_consumes_then_rejection() {
    let (gate, _) = gate_with_memory_store();

    for expected in 1..=3u32 {
        let outcome = gate.consume_one("alice", None).await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.used, expected);
    }

    let fourth = gate.consume_one("alice", None).await.unwrap();
    assert!(!fourth.accepted);
    assert_eq!(fourth.used, 3);
    assert_eq!(fourth.remaining, 0);
}

#[tokio::test]
async fn test_check_reflects_consumption() {
    let (gate, _) = gate_with_memory_store();

    for k in 1..=2u32 {
        gate.consume_one("alice", None).await.unwrap();
        let snapshot = gate.check_remaining("alice", None).await.unwrap();
        assert_eq!(snapshot.used, k);
        assert_eq!(snapshot.remaining, snapshot.limit - k);
    }

    // Reads never mutate.
    let before = gate.check_remaining("alice", None).await.unwrap();
    let after = gate.check_remaining("alice", None).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_quota_resets_after_day_rollover() {
    let (gate, _) = gate_with_memory_store();
    let day_one = Utc.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap();
    let day_two = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 1).unwrap();

    for _ in 0..3 {
        let outcome = gate.consume_one_at("alice", None, day_one).await.unwrap();
        assert!(outcome.accepted);
    }
    let exhausted = gate.consume_one_at("alice", None, day_one).await.unwrap();
    assert!(!exhausted.accepted);

    // Next reference day: fresh pool.
    let renewed = gate.consume_one_at("alice", None, day_two).await.unwrap();
    assert!(renewed.accepted);
    assert_eq!(renewed.used, 1);

    let snapshot = gate.check_remaining_at("alice", None, day_two).await.unwrap();
    assert_eq!(snapshot.used, 1);
    assert_eq!(snapshot.remaining, 2);
}

#[tokio::test]
async fn test_concurrent_consumers_share_min_of_n_and_limit() {
    let store = Arc::new(MemoryQuotaStore::new());
    let gate = Arc::new(QuotaGate::new(
        store.clone(),
        DayBoundaryPolicy::utc(),
        LimitPolicy::default(),
    ));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.consume_one("alice", None).await.unwrap() })
        })
        .collect();

    let mut accepted = 0;
    for task in tasks {
        if task.await.unwrap().accepted {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 3);

    let snapshot = gate.check_remaining("alice", None).await.unwrap();
    assert_eq!(snapshot.used, 3);
    assert_eq!(snapshot.remaining, 0);
}

#[tokio::test]
async fn test_snapshot_carries_reset_instant() {
    let (gate, _) = gate_with_memory_store();
    let now = Utc.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap();

    let snapshot = gate.check_remaining_at("alice", None, now).await.unwrap();
    assert_eq!(snapshot.period_key, "2026-08-06");
    assert_eq!(
        snapshot.resets_at,
        Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_tier_override_raises_the_ceiling() {
    let store = Arc::new(MemoryQuotaStore::new());
    let limits = LimitPolicy::default().with_tier("business", 5);
    let gate = QuotaGate::new(store, DayBoundaryPolicy::utc(), limits);

    let personal = gate.check_remaining("carol", None).await.unwrap();
    assert_eq!(personal.limit, 3);

    let business = gate.check_remaining("carol", Some("business")).await.unwrap();
    assert_eq!(business.limit, 5);

    let unknown = gate.check_remaining("carol", Some("platinum")).await.unwrap();
    assert_eq!(unknown.limit, 3);
}

#[tokio::test]
async fn test_tiers_share_one_usage_pool() {
    // Tier changes the ceiling, never the counter: units consumed on the
    // personal dashboard count against the business ceiling too.
    let store = Arc::new(MemoryQuotaStore::new());
    let limits = LimitPolicy::default().with_tier("business", 5);
    let gate = QuotaGate::new(store, DayBoundaryPolicy::utc(), limits);

    for _ in 0..3 {
        assert!(gate.consume_one("carol", None).await.unwrap().accepted);
    }
    assert!(!gate.consume_one("carol", None).await.unwrap().accepted);

    let business = gate.check_remaining("carol", Some("business")).await.unwrap();
    assert_eq!(business.used, 3);
    assert_eq!(business.remaining, 2);
}

#[tokio::test]
async fn test_invalid_user_keys_never_touch_the_store() {
    let (gate, store) = gate_with_memory_store();

    for bad in ["", "   ", "\t"] {
        assert!(matches!(
            gate.check_remaining(bad, None).await,
            Err(QuotaError::InvalidUserKey(_))
        ));
        assert!(matches!(
            gate.consume_one(bad, None).await,
            Err(QuotaError::InvalidUserKey(_))
        ));
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_storage_outage_is_an_error_not_unlimited() {
    let gate = QuotaGate::new(
        Arc::new(FailingStore),
        DayBoundaryPolicy::utc(),
        LimitPolicy::default(),
    );

    // A read outage must surface, not default to a full pool.
    assert!(matches!(
        gate.check_remaining("alice", None).await,
        Err(QuotaError::Storage(QuotaStoreError::Unavailable(_)))
    ));

    // A write outage yields no grant: fail-closed admission.
    assert!(matches!(
        gate.consume_one("alice", None).await,
        Err(QuotaError::Storage(QuotaStoreError::Unavailable(_)))
    ));
}
