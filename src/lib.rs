// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod quota;
pub mod version;

// Re-export the gate contract and its collaborators
pub use quota::{
    ConsumeOutcome, DayBoundaryPolicy, IncrementOutcome, LimitPolicy, MemoryQuotaStore,
    QuotaError, QuotaGate, QuotaStore, QuotaStoreError, SqliteQuotaStore, UsageSnapshot,
    DEFAULT_DAILY_LIMIT,
};

// Re-export the service surface
pub use api::{ApiConfig, ApiError, ApiServer, ErrorResponse};
pub use config::{QuotaServiceConfig, StorageBackend, StorageConfig};
