//! Binary entrypoint for the status page webhook server.

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use status_engine::Engine;
use webhook_server::{AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = ServerConfig::parse();

  let filter = if config.debug {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(filter)
    .init();

  let state = Arc::new(AppState::new(Engine::new(config.engine_config())));
  let evictor = webhook_server::spawn_eviction_task(state.clone(), config.evict_interval());
  let app = webhook_server::router(state);

  let addr = config.socket_addr();
  tracing::info!("status monitor listening on http://{} (event-based, no polling)", addr);
  tracing::info!("webhook endpoint: http://{}/webhook/statuspage", addr);
  tracing::info!("health check: http://{}/health", addr);
  tracing::info!("local smoke test: curl -X POST http://localhost:{}/test", config.port);

  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  evictor.abort();
  tracing::info!("shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}
