//! Status API server

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;

use crate::audio::buffer::SharedRingBuffer;
use crate::audio::format::PcmFormat;
use crate::config::UiConfig;
use crate::monitor::counters::SharedCounters;
use crate::monitor::stats::SharedSnapshot;
use crate::ui::handlers;

/// Read-only handles shared with the handlers
pub struct AppState {
    pub buffer: SharedRingBuffer,
    pub counters: SharedCounters,
    pub latest: SharedSnapshot,
    pub format: PcmFormat,
    pub started: Instant,
}

pub struct WebServer {
    config: UiConfig,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: UiConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/status", get(handlers::get_status))
            .route("/api/devices", get(handlers::get_devices))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Serve until the runtime shuts down
    pub async fn run(self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.bind_address, self.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Status API available at http://{}", listener.local_addr()?);
        axum::serve(listener, self.router()).await
    }

    pub fn start_background(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                tracing::error!("Status API stopped: {}", e);
            }
        })
    }
}
