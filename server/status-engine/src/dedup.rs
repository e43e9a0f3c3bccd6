//! Idempotent change detection: decide NEW vs DUPLICATE and update the store.

use chrono::{DateTime, Utc};

use crate::key;
use crate::store::IncidentStore;
use crate::types::{Decision, IncidentEvent, StoredIncidentRecord};

/// Admit one normalized event.
///
/// Runs entirely under the lock of the event's shard, so concurrent
/// deliveries of one incident are admitted one at a time in arrival order.
/// Ordering between updates is by arrival: an older `updated_at` whose key
/// was never emitted is still NEW.
pub fn admit(event: &IncidentEvent, store: &IncidentStore, received_at: DateTime<Utc>) -> Decision {
  let key = key::compute(event);

  store.with_shard(&event.incident_id, |shard| {
    match shard.get_mut(&event.incident_id) {
      None => {
        shard.insert(
          event.incident_id.clone(),
          StoredIncidentRecord::from_event(event, key, received_at),
        );
        Decision::New
      }
      Some(record) => {
        record.received_at = received_at;
        if record.emitted_keys.insert(key) {
          record.apply(event);
          Decision::New
        } else {
          tracing::debug!(
            incident_id = %event.incident_id,
            updated_at = %event.updated_at,
            "duplicate delivery suppressed"
          );
          Decision::Duplicate
        }
      }
    }
  })
}
