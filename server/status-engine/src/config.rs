//! Engine configuration with sane defaults.

use chrono::Duration;

/// How the "latest" entry of `incident.incident_updates` is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateSelection {
  /// Element 0 is authoritative (providers deliver newest-first).
  #[default]
  First,
  /// Greatest parseable `updated_at`/`created_at` wins; falls back to element 0.
  NewestByTimestamp,
}

impl UpdateSelection {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "first" | "positional" => Some(Self::First),
      "newest" | "timestamp" | "newest-by-timestamp" => Some(Self::NewestByTimestamp),
      _ => None,
    }
  }
}

/// Tunables for normalization and the incident store.
#[derive(Debug, Clone)]
pub struct Config {
  /// Number of independently locked store partitions.
  pub shard_count: usize,
  /// Records not seen for longer than this are evicted. `None` keeps them forever.
  pub retention: Option<Duration>,
  /// Upper bound on tracked incidents; oldest `received_at` goes first.
  pub max_incidents: Option<usize>,
  /// Display name used when a payload has no `page.name`.
  pub unknown_provider_name: String,
  pub latest_update: UpdateSelection,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      shard_count: 16,
      retention: Some(Duration::days(7)),
      max_incidents: Some(10_000),
      unknown_provider_name: "Unknown".into(),
      latest_update: UpdateSelection::First,
    }
  }
}
