// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! environment overrides. The daily ceiling and the reference timezone
//! are configuration, not constants; tiered plans and a different
//! reference day ship without code changes.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::quota::{DayBoundaryPolicy, LimitPolicy, DEFAULT_DAILY_LIMIT};

/// Which quota store backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local counters; lost on restart. Tests and dev only.
    Memory,
    /// Durable counters in a SQLite file shared across processes.
    Sqlite,
}

/// Storage backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file path; required for the sqlite backend.
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: Some(PathBuf::from("./quota.db")),
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaServiceConfig {
    /// Address the usage API listens on
    pub listen_addr: String,
    /// Default generations per user per day
    pub daily_limit: u32,
    /// Per-tier ceiling overrides, e.g. business = 20
    pub tier_limits: HashMap<String, u32>,
    /// Reference UTC offset bounding the quota day (UTC, Z, or [+-]HH:MM)
    pub utc_offset: String,
    /// Quota store backend
    pub storage: StorageConfig,
    /// Days of past-period records to keep before the daily sweep prunes
    /// them. None disables pruning entirely.
    pub retention_days: Option<u32>,
    /// Origins allowed by CORS on the usage API
    pub cors_allowed_origins: Vec<String>,
}

impl Default for QuotaServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            daily_limit: DEFAULT_DAILY_LIMIT,
            tier_limits: HashMap::new(),
            utc_offset: "UTC".to_string(),
            storage: StorageConfig::default(),
            retention_days: Some(30),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl QuotaServiceConfig {
    /// Load configuration: defaults, then the TOML file if given, then
    /// environment overrides. Validates before returning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply QUOTA_* environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = env::var("QUOTA_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(limit) = env::var("QUOTA_DAILY_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            self.daily_limit = limit;
        }
        if let Ok(offset) = env::var("QUOTA_UTC_OFFSET") {
            self.utc_offset = offset;
        }
        if let Ok(backend) = env::var("QUOTA_STORAGE_BACKEND") {
            match backend.to_ascii_lowercase().as_str() {
                "memory" => self.storage.backend = StorageBackend::Memory,
                "sqlite" => self.storage.backend = StorageBackend::Sqlite,
                other => tracing::warn!("⚠️ Unknown QUOTA_STORAGE_BACKEND '{}', keeping configured backend", other),
            }
        }
        if let Ok(path) = env::var("QUOTA_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
        if let Ok(days) = env::var("QUOTA_RETENTION_DAYS") {
            self.retention_days = days.parse::<u32>().ok();
        }
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.daily_limit == 0 {
            return Err(anyhow!("daily_limit must be at least 1"));
        }
        if let Some((tier, _)) = self.tier_limits.iter().find(|(_, limit)| **limit == 0) {
            return Err(anyhow!("tier_limits.{} must be at least 1", tier));
        }
        DayBoundaryPolicy::parse_offset(&self.utc_offset)
            .map_err(|e| anyhow!("utc_offset: {}", e))?;
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.is_none() {
            return Err(anyhow!("storage.path is required for the sqlite backend"));
        }
        self.listen_addr
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("listen_addr '{}' is not a socket address", self.listen_addr))?;
        Ok(())
    }

    /// Boundary policy derived from the configured offset.
    pub fn boundary_policy(&self) -> Result<DayBoundaryPolicy> {
        let offset = DayBoundaryPolicy::parse_offset(&self.utc_offset)
            .map_err(|e| anyhow!("utc_offset: {}", e))?;
        Ok(DayBoundaryPolicy::new(offset))
    }

    /// Limit policy derived from the default ceiling and tier overrides.
    pub fn limit_policy(&self) -> LimitPolicy {
        LimitPolicy {
            default_limit: self.daily_limit,
            tiers: self.tier_limits.clone(),
        }
    }
}
