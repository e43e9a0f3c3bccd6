//! Stable dedup keys and shard selection.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

use crate::types::{DedupKey, IncidentEvent};

/// Compute the dedup key for an event.
///
/// Key components: incident_id + updated_at normalized to UTC at nanosecond
/// precision, so one instant written in two offsets yields one key. An
/// unreadable `updated_at` keys on the provider's text instead.
pub fn compute(event: &IncidentEvent) -> DedupKey {
  match &event.updated_at_raw {
    Some(raw) => compute_raw(&event.incident_id, raw),
    None => compute_parts(&event.incident_id, &event.updated_at),
  }
}

pub fn compute_parts(incident_id: &str, updated_at: &DateTime<FixedOffset>) -> DedupKey {
  let instant = updated_at
    .with_timezone(&Utc)
    .to_rfc3339_opts(SecondsFormat::Nanos, true);
  digest(incident_id, "ts", &instant)
}

/// Key for an `updated_at` that only exists as opaque provider text.
pub fn compute_raw(incident_id: &str, raw_updated_at: &str) -> DedupKey {
  digest(incident_id, "raw", raw_updated_at)
}

fn digest(incident_id: &str, kind: &str, updated_at: &str) -> DedupKey {
  let mut hasher = blake3::Hasher::new();
  hasher.update(incident_id.as_bytes());
  hasher.update(b"|");
  hasher.update(kind.as_bytes());
  hasher.update(b"|");
  hasher.update(updated_at.as_bytes());

  // First 16 bytes (32 hex chars) is plenty for per-process dedup.
  let hex = hasher.finalize().to_hex();
  DedupKey(hex[..32].to_string())
}

/// Partition index for an incident id, in `0..shard_count`.
pub fn shard_index(incident_id: &str, shard_count: usize) -> usize {
  let hash = blake3::hash(incident_id.as_bytes());
  let mut prefix = [0u8; 8];
  prefix.copy_from_slice(&hash.as_bytes()[..8]);
  (u64::from_le_bytes(prefix) % shard_count.max(1) as u64) as usize
}
