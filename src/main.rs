// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, info, warn};

use styleai_quota::api::{ApiConfig, ApiServer};
use styleai_quota::config::{QuotaServiceConfig, StorageBackend};
use styleai_quota::quota::{
    DayBoundaryPolicy, MemoryQuotaStore, QuotaGate, QuotaStore, SqliteQuotaStore,
};

/// Daily generation quota service for the StyleAI dashboards
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "QUOTA_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long)]
    listen_addr: Option<String>,

    /// Override the default daily limit
    #[arg(long)]
    daily_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    info!("🚀 Starting StyleAI quota service...");
    info!("📦 BUILD VERSION: {}", styleai_quota::version::VERSION);

    let mut config = QuotaServiceConfig::load(cli.config.as_deref())?;
    if let Some(addr) = cli.listen_addr {
        config.listen_addr = addr;
    }
    if let Some(limit) = cli.daily_limit {
        config.daily_limit = limit;
    }
    config.validate()?;

    let boundary = config.boundary_policy()?;
    let store: Arc<dyn QuotaStore> = match config.storage.backend {
        StorageBackend::Memory => {
            warn!("⚠️ Memory store selected; usage counters will not survive a restart");
            Arc::new(MemoryQuotaStore::new())
        }
        StorageBackend::Sqlite => {
            let path = config
                .storage
                .path
                .clone()
                .ok_or_else(|| anyhow::anyhow!("storage.path is required for the sqlite backend"))?;
            Arc::new(SqliteQuotaStore::connect(&path).await?)
        }
    };

    let gate = Arc::new(QuotaGate::new(
        store.clone(),
        boundary,
        config.limit_policy(),
    ));

    if let Some(retention_days) = config.retention_days {
        spawn_retention_sweep(store, boundary, retention_days);
    }

    let api_config = ApiConfig {
        listen_addr: config.listen_addr.clone(),
        cors_allowed_origins: config.cors_allowed_origins.clone(),
    };
    let mut server = ApiServer::bind(api_config, gate).await?;
    server.start().await;

    info!("✅ Quota service ready (daily limit {})", config.daily_limit);

    signal::ctrl_c().await?;
    info!("🛑 Shutdown signal received");
    server.shutdown().await;

    Ok(())
}

/// Prune counters for periods older than the retention horizon, once a
/// day. Hygiene only; the gate never reads past periods.
fn spawn_retention_sweep(
    store: Arc<dyn QuotaStore>,
    boundary: DayBoundaryPolicy,
    retention_days: u32,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
        loop {
            interval.tick().await;
            let cutoff_instant = chrono::Utc::now() - chrono::Duration::days(retention_days as i64);
            let cutoff = boundary.current_period_key(cutoff_instant);
            match store.prune_periods_before(&cutoff).await {
                Ok(removed) if removed > 0 => {
                    info!("🧹 Retention sweep removed {} records before {}", removed, cutoff)
                }
                Ok(_) => debug!("Retention sweep found nothing to remove before {}", cutoff),
                Err(e) => warn!("⚠️ Retention sweep failed: {}", e),
            }
        }
    })
}
