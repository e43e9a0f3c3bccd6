//! Core engine: owns the store, runs normalize -> admit -> format.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::Config;
use crate::dedup;
use crate::error::NormalizeError;
use crate::format;
use crate::normalize;
use crate::store::IncidentStore;
use crate::types::*;

/// The webhook pipeline. Shared by all request handlers (`&self` everywhere).
pub struct Engine {
  config: Config,
  store: IncidentStore,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    let store = IncidentStore::new(config.shard_count);
    Self { config, store }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn store(&self) -> &IncidentStore {
    &self.store
  }

  /// Process one decoded webhook payload, received now.
  pub fn process(&self, payload: &Value) -> Result<Outcome, NormalizeError> {
    self.process_at(payload, Utc::now())
  }

  /// Process one decoded webhook payload received at `now`.
  ///
  /// Returns the canonical line in `Outcome::notification` only when the
  /// update has not been emitted before. A normalization failure leaves the
  /// store untouched.
  pub fn process_at(&self, payload: &Value, now: DateTime<Utc>) -> Result<Outcome, NormalizeError> {
    let event = normalize::normalize(payload, &self.config, now)?;
    let decision = dedup::admit(&event, &self.store, now);

    let notification = match decision {
      Decision::New => {
        tracing::info!(
          incident_id = %event.incident_id,
          "[NEW] {} - {} ({})",
          event.provider_page_name,
          event.incident_name,
          event.status
        );
        if let Some(max) = self.config.max_incidents {
          let evicted = self.store.enforce_capacity(max);
          if evicted > 0 {
            tracing::info!(evicted, max, "incident store over capacity; evicted oldest records");
          }
        }
        Some(format::format_notification(&event))
      }
      Decision::Duplicate => None,
    };

    Ok(Outcome {
      incident_id: event.incident_id,
      decision,
      notification,
    })
  }

  pub fn incidents(&self) -> Vec<IncidentListing> {
    self.store.get_all().iter().map(|r| r.to_listing()).collect()
  }

  pub fn stats(&self) -> StoreStats {
    self.store.stats()
  }

  /// Apply the retention window, if one is configured. Returns records evicted.
  pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
    match self.config.retention {
      Some(retention) => self.store.evict_expired(now, retention),
      None => 0,
    }
  }
}

impl Default for Engine {
  fn default() -> Self {
    Self::with_defaults()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};
  use serde_json::json;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, 15, 0, 0).unwrap()
  }

  fn payload(id: &str, updated_at: &str) -> Value {
    json!({
      "incident": {
        "id": id,
        "name": "Elevated error rates",
        "status": "investigating",
        "updated_at": updated_at,
        "components": [{"name": "Chat Completions"}],
        "incident_updates": [{"body": "Degraded performance due to upstream issue"}]
      },
      "page": {"name": "OpenAI API"}
    })
  }

  #[test]
  fn new_update_produces_notification() {
    let engine = Engine::with_defaults();
    let outcome = engine
      .process_at(&payload("abc123", "2025-11-03T14:32:00Z"), now())
      .unwrap();
    assert_eq!(outcome.incident_id, "abc123");
    assert_eq!(outcome.decision, Decision::New);
    assert_eq!(
      outcome.notification.as_deref(),
      Some(
        "[2025-11-03 14:32:00] Product: OpenAI API - Chat Completions\n\
         Status: Degraded performance due to upstream issue"
      )
    );
  }

  #[test]
  fn duplicate_produces_no_notification() {
    let engine = Engine::with_defaults();
    let p = payload("abc123", "2025-11-03T14:32:00Z");
    engine.process_at(&p, now()).unwrap();
    let outcome = engine.process_at(&p, now()).unwrap();
    assert_eq!(outcome.decision, Decision::Duplicate);
    assert!(outcome.notification.is_none());
    assert_eq!(engine.stats().total_updates, 1);
  }

  #[test]
  fn invalid_payload_leaves_store_untouched() {
    let engine = Engine::with_defaults();
    let err = engine
      .process_at(&json!({"incident": {"status": "resolved"}}), now())
      .unwrap_err();
    assert_eq!(err.field(), "incident.id");
    assert_eq!(engine.stats(), StoreStats::default());
  }

  #[test]
  fn capacity_cap_evicts_oldest() {
    let engine = Engine::new(Config {
      max_incidents: Some(2),
      ..Config::default()
    });
    for (i, id) in ["a", "b", "c"].iter().enumerate() {
      engine
        .process_at(&payload(id, "2025-11-03T14:32:00Z"), now() + Duration::seconds(i as i64))
        .unwrap();
    }
    let ids: Vec<_> = engine.incidents().into_iter().map(|l| l.id).collect();
    assert_eq!(ids, vec!["b", "c"]);
  }

  #[test]
  fn admission_under_cap_only_locks_its_own_shard() {
    let engine = Engine::new(Config {
      shard_count: 2,
      max_incidents: Some(100),
      ..Config::default()
    });
    let held_id = "held";
    let held_shard = crate::key::shard_index(held_id, 2);
    let free_id = (0..)
      .map(|n| format!("free-{}", n))
      .find(|id| crate::key::shard_index(id, 2) != held_shard)
      .unwrap();

    let guard = engine.store().lock(held_shard);
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::scope(|s| {
      let (engine, free_id) = (&engine, &free_id);
      s.spawn(move || {
        let outcome = engine.process_at(&payload(free_id, "2025-11-03T14:32:00Z"), now());
        let _ = tx.send(outcome.map(|o| o.decision));
      });
      let admitted = rx.recv_timeout(std::time::Duration::from_secs(5));
      drop(guard);
      assert_eq!(admitted, Ok(Ok(Decision::New)));
    });
  }

  #[test]
  fn retention_window_evicts_stale_records() {
    let engine = Engine::new(Config {
      retention: Some(Duration::hours(1)),
      ..Config::default()
    });
    engine.process_at(&payload("old", "2025-11-03T10:00:00Z"), now()).unwrap();
    engine
      .process_at(&payload("new", "2025-11-03T10:00:00Z"), now() + Duration::hours(2))
      .unwrap();
    assert_eq!(engine.evict_expired(now() + Duration::hours(2)), 1);
    assert_eq!(engine.stats().incidents_tracked, 1);

    let keep_forever = Engine::new(Config {
      retention: None,
      ..Config::default()
    });
    keep_forever.process_at(&payload("old", "2025-11-03T10:00:00Z"), now()).unwrap();
    assert_eq!(keep_forever.evict_expired(now() + Duration::days(365)), 0);
  }

  #[test]
  fn listing_exposes_latest_state() {
    let engine = Engine::with_defaults();
    engine.process_at(&payload("abc123", "2025-11-03T14:32:00Z"), now()).unwrap();
    let listing = engine.incidents();
    assert_eq!(listing.len(), 1);
    let l = &listing[0];
    assert_eq!(l.id, "abc123");
    assert_eq!(l.name, "Elevated error rates");
    assert_eq!(l.provider, "OpenAI API");
    assert_eq!(l.status, "investigating");
    assert_eq!(l.components, vec!["Chat Completions"]);
    assert_eq!(l.latest_message, "Degraded performance due to upstream issue");
    assert_eq!(l.received_at, "2025-11-03T15:00:00.000Z");
  }
}
