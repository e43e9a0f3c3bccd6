//! Core types for the status engine (canonical event, store records, JSON views).

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Canonical event (post-normalization)
// ---------------------------------------------------------------------------

/// One provider update after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentEvent {
  pub provider_page_name: String,
  pub incident_id: String,
  /// Incident title as shown on the status page.
  pub incident_name: String,
  /// Deduplicated, order as received.
  pub component_names: Vec<String>,
  pub status: String,
  /// Keeps the provider's offset so rendering shows the provider's wall clock.
  pub updated_at: DateTime<FixedOffset>,
  /// Provider text of an `updated_at` that could not be read as a timestamp.
  /// When set, the dedup key is built from this text instead of `updated_at`.
  pub updated_at_raw: Option<String>,
  pub message: String,
}

// ---------------------------------------------------------------------------
// Dedup key
// ---------------------------------------------------------------------------

/// Stable hex digest of `(incident_id, updated_at)`, or of the raw provider
/// text when `updated_at` was unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
  New,
  Duplicate,
}

// ---------------------------------------------------------------------------
// Store records
// ---------------------------------------------------------------------------

/// Latest known state of one incident plus every key already emitted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIncidentRecord {
  pub incident_id: String,
  pub provider_page_name: String,
  pub incident_name: String,
  pub component_names: Vec<String>,
  pub status: String,
  pub message: String,
  pub updated_at: DateTime<FixedOffset>,
  pub received_at: DateTime<Utc>,
  pub emitted_keys: HashSet<DedupKey>,
}

impl StoredIncidentRecord {
  /// Fresh record for a first sighting; `key` is already marked emitted.
  pub fn from_event(event: &IncidentEvent, key: DedupKey, received_at: DateTime<Utc>) -> Self {
    let mut emitted_keys = HashSet::with_capacity(1);
    emitted_keys.insert(key);
    Self {
      incident_id: event.incident_id.clone(),
      provider_page_name: event.provider_page_name.clone(),
      incident_name: event.incident_name.clone(),
      component_names: event.component_names.clone(),
      status: event.status.clone(),
      message: event.message.clone(),
      updated_at: event.updated_at,
      received_at,
      emitted_keys,
    }
  }

  /// Overwrite the mutable fields with the incoming update (last writer wins).
  pub fn apply(&mut self, event: &IncidentEvent) {
    self.provider_page_name = event.provider_page_name.clone();
    self.incident_name = event.incident_name.clone();
    self.component_names = event.component_names.clone();
    self.status = event.status.clone();
    self.message = event.message.clone();
    self.updated_at = event.updated_at;
  }

  pub fn to_listing(&self) -> IncidentListing {
    IncidentListing {
      id: self.incident_id.clone(),
      name: self.incident_name.clone(),
      provider: self.provider_page_name.clone(),
      status: self.status.clone(),
      components: self.component_names.clone(),
      latest_message: self.message.clone(),
      updated_at: self.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
      received_at: self.received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
  }
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what introspection exposes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentListing {
  pub id: String,
  pub name: String,
  pub provider: String,
  pub status: String,
  pub components: Vec<String>,
  pub latest_message: String,
  pub updated_at: String,
  pub received_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StoreStats {
  pub incidents_tracked: usize,
  pub total_updates: usize,
}

/// Result of pushing one payload through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
  pub incident_id: String,
  pub decision: Decision,
  /// Canonical notification line; present only for `Decision::New`.
  pub notification: Option<String>,
}
