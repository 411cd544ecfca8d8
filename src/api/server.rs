// Copyright (c) 2026 StyleAI Studio
// SPDX-License-Identifier: BUSL-1.1
//! Usage API server
//!
//! Thin axum surface over the quota gate: a health route, the usage
//! snapshot read, and the consume write. Runs in the background with
//! graceful shutdown so the binary can supervise it alongside the
//! retention sweep.

use anyhow::Result;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::usage::{consume_handler, usage_handler};
use crate::quota::QuotaGate;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<QuotaGate>,
}

/// Response for GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Usage API server
pub struct ApiServer {
    config: ApiConfig,
    addr: SocketAddr,
    state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    listener: Option<tokio::net::TcpListener>,
}

impl ApiServer {
    /// Bind the listen address without serving yet. Binding to port 0
    /// picks a free port, which tests rely on.
    pub async fn bind(config: ApiConfig, gate: Arc<QuotaGate>) -> Result<Self> {
        let addr: SocketAddr = config.listen_addr.parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_addr = listener.local_addr()?;

        info!("🚀 Usage API listening on {}", actual_addr);

        Ok(Self {
            config,
            addr: actual_addr,
            state: AppState { gate },
            shutdown_tx: None,
            listener: Some(listener),
        })
    }

    /// The address the server actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve in a background task until `shutdown` is called.
    pub async fn start(&mut self) {
        if let Some(listener) = self.listener.take() {
            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            self.shutdown_tx = Some(shutdown_tx);

            let app = Self::create_router(self.state.clone(), &self.config);

            tokio::spawn(async move {
                let serve_future =
                    axum::serve(listener, app).with_graceful_shutdown(async move {
                        let _ = shutdown_rx.await;
                    });
                if let Err(e) = serve_future.await {
                    warn!("⚠️ Usage API server exited with error: {}", e);
                }
            });
        }
    }

    /// Signal the background task to drain and stop.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("👋 Usage API shutting down");
        }
    }

    /// Build the router. Public so integration tests can drive the
    /// routes without a socket.
    pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
        let cors = Self::cors_layer(&config.cors_allowed_origins);

        Router::new()
            .route("/health", get(health_handler))
            .route("/v1/usage", get(usage_handler))
            .route("/v1/usage/consume", post(consume_handler))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(state)
    }

    fn cors_layer(origins: &[String]) -> CorsLayer {
        if origins.iter().any(|o| o == "*") {
            return CorsLayer::new().allow_origin(Any).allow_headers(Any);
        }

        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("⚠️ Ignoring unparseable CORS origin '{}'", o);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_headers(Any)
    }
}

async fn health_handler(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::version::VERSION.to_string(),
    })
}
