//! Server configuration: CLI flags with environment fallbacks.

use chrono::Duration;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};

use status_engine::{Config, UpdateSelection};

/// One hundred years.
const MAX_RETENTION_HOURS: u64 = 876_000;

#[derive(Debug, Clone, Parser)]
#[command(
  name = "webhook-server",
  about = "Event-based status page monitor (webhooks, no polling)",
  long_about = "Configure each provider's webhook to POST to http://<host>:<port>/webhook/statuspage.\n\
                Local smoke test: curl -X POST http://localhost:5000/test"
)]
pub struct ServerConfig {
  /// Address to bind to.
  #[arg(long, default_value = "0.0.0.0")]
  pub host: IpAddr,

  /// Port to run the webhook server on.
  #[arg(long, env = "PORT", default_value_t = 5000)]
  pub port: u16,

  /// Enable debug logging (overrides RUST_LOG).
  #[arg(long)]
  pub debug: bool,

  /// Number of independently locked incident store partitions.
  #[arg(long, env = "STATUS_SHARDS", default_value_t = 16)]
  pub shards: usize,

  /// Evict incidents not heard from for this many hours (0 keeps them forever).
  #[arg(
    long,
    env = "STATUS_RETENTION_HOURS",
    default_value_t = 168,
    value_parser = clap::value_parser!(u64).range(0..=MAX_RETENTION_HOURS)
  )]
  pub retention_hours: u64,

  /// Maximum tracked incidents (0 means unbounded).
  #[arg(long, env = "STATUS_MAX_INCIDENTS", default_value_t = 10_000)]
  pub max_incidents: usize,

  /// Which incident update is the latest: `first` (positional) or `newest` (by timestamp).
  #[arg(long, env = "STATUS_LATEST_UPDATE", default_value = "first", value_parser = parse_update_selection)]
  pub latest_update: UpdateSelection,

  /// Seconds between retention sweeps.
  #[arg(long, default_value_t = 60)]
  pub evict_interval_secs: u64,
}

fn parse_update_selection(s: &str) -> Result<UpdateSelection, String> {
  UpdateSelection::from_str_loose(s).ok_or_else(|| format!("expected first|newest, got {:?}", s))
}

impl ServerConfig {
  pub fn socket_addr(&self) -> SocketAddr {
    SocketAddr::new(self.host, self.port)
  }

  pub fn engine_config(&self) -> Config {
    Config {
      shard_count: self.shards.max(1),
      retention: i64::try_from(self.retention_hours)
        .ok()
        .filter(|hours| *hours > 0)
        .and_then(Duration::try_hours),
      max_incidents: (self.max_incidents > 0).then_some(self.max_incidents),
      latest_update: self.latest_update,
      ..Config::default()
    }
  }

  pub fn evict_interval(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.evict_interval_secs.max(1))
  }
}
