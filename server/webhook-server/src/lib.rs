//! Status Page Webhook Server
//!
//! HTTP service that receives provider webhooks, feeds them through the
//! status engine, and prints one canonical line per new incident update.
//! Binds 0.0.0.0:5000 by default.

mod config;
mod error;
mod handlers;
mod sink;
mod state;
mod types;

use axum::{
  routing::{get, post},
  Router,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use handlers::{health, list_incidents, statuspage_webhook, test_payload, test_webhook};
pub use sink::{NotificationSink, StdoutSink};
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/webhook/statuspage", post(statuspage_webhook))
    .route("/test", post(test_webhook))
    .route("/health", get(health))
    .route("/incidents", get(list_incidents))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}

/// Periodically apply the engine's retention window.
pub fn spawn_eviction_task(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    // The first tick completes immediately; nothing to evict at startup.
    ticker.tick().await;
    loop {
      ticker.tick().await;
      let evicted = state.engine.evict_expired(Utc::now());
      if evicted > 0 {
        tracing::info!(evicted, "evicted incidents past retention window");
      }
    }
  })
}
