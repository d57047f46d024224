//! HTTP surface
//!
//! A thin axum router over the resolver and the cleanup sweep.

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::WebConfig;
use crate::database::Database;
use crate::services::{ExpiredArtifactSweeper, ResourceResolver};

pub mod handlers;
pub mod responses;

pub use responses::{ApiResponse, HealthResponse, handle_error, handle_result};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub resolver: Arc<ResourceResolver>,
    pub sweeper: Arc<ExpiredArtifactSweeper>,
}

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: &WebConfig, state: AppState) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
        Ok(Self {
            app: Self::router(state),
            addr,
        })
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health_check))
            .route("/api/v1/logos/cleanup", post(handlers::clean_expired))
            .route("/api/v1/logos/{name}", get(handlers::get_logo))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Serve until `cancellation_token` fires, or SIGINT/SIGTERM without one
    pub async fn serve_with_cancellation(self, cancellation_token: Option<CancellationToken>) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.addr, e))?;
        info!("Listening on http://{}", self.addr);

        let shutdown_signal = async move {
            match cancellation_token {
                Some(token) => {
                    token.cancelled().await;
                    info!("Web server received cancellation signal, shutting down gracefully");
                }
                None => wait_for_signal().await,
            }
        };

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal)
            .await?;
        Ok(())
    }
}

/// Resolve on SIGINT or SIGTERM
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                    _ = sigint.recv() => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
                }
            }
            _ => {
                tracing::warn!("Failed to install unix signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down gracefully");
    }
}
