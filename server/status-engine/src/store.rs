//! Process-wide incident store: incident_id -> latest known record.
//!
//! The map is split into independently locked shards keyed by a hash of the
//! incident id. Updates to one incident serialize on its shard; different
//! incidents usually land on different shards and proceed in parallel.

use chrono::{DateTime, Duration, Utc};
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::key;
use crate::types::{StoreStats, StoredIncidentRecord};

pub(crate) type Shard = HashMap<String, StoredIncidentRecord>;

pub struct IncidentStore {
  shards: Vec<Mutex<Shard>>,
  /// Records across all shards; adjusted under the owning shard's lock.
  len: AtomicUsize,
}

impl IncidentStore {
  pub fn new(shard_count: usize) -> Self {
    let shards = (0..shard_count.max(1))
      .map(|_| Mutex::new(HashMap::new()))
      .collect();
    Self {
      shards,
      len: AtomicUsize::new(0),
    }
  }

  pub fn shard_count(&self) -> usize {
    self.shards.len()
  }

  pub(crate) fn lock(&self, index: usize) -> MutexGuard<'_, Shard> {
    // Records are plain data; a panic mid-update cannot leave them half-built.
    self.shards[index]
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn lock_all(&self) -> Vec<MutexGuard<'_, Shard>> {
    // Always ascending index order, so two full-store walkers cannot deadlock.
    (0..self.shards.len()).map(|i| self.lock(i)).collect()
  }

  fn track(&self, before: usize, after: usize) {
    if after > before {
      self.len.fetch_add(after - before, Ordering::Relaxed);
    } else if before > after {
      self.len.fetch_sub(before - after, Ordering::Relaxed);
    }
  }

  /// Run `f` with exclusive access to the shard owning `incident_id`.
  pub(crate) fn with_shard<R>(&self, incident_id: &str, f: impl FnOnce(&mut Shard) -> R) -> R {
    let mut shard = self.lock(key::shard_index(incident_id, self.shards.len()));
    let before = shard.len();
    let result = f(&mut shard);
    self.track(before, shard.len());
    result
  }

  /// Insert or replace a record, returning the previous one.
  pub fn upsert(&self, record: StoredIncidentRecord) -> Option<StoredIncidentRecord> {
    let id = record.incident_id.clone();
    self.with_shard(&id, |shard| shard.insert(id.clone(), record))
  }

  pub fn get(&self, incident_id: &str) -> Option<StoredIncidentRecord> {
    self.with_shard(incident_id, |shard| shard.get(incident_id).cloned())
  }

  /// Point-in-time copy of every record, oldest `received_at` first.
  pub fn get_all(&self) -> Vec<StoredIncidentRecord> {
    let guards = self.lock_all();
    let mut records: Vec<StoredIncidentRecord> = guards
      .iter()
      .flat_map(|shard| shard.values().cloned())
      .collect();
    drop(guards);

    records.sort_by(|a, b| {
      a.received_at
        .cmp(&b.received_at)
        .then_with(|| a.incident_id.cmp(&b.incident_id))
    });
    records
  }

  /// Number of tracked incidents. Lock-free.
  pub fn count(&self) -> usize {
    self.len.load(Ordering::Relaxed)
  }

  /// Total number of keys emitted across all incidents.
  pub fn emitted_count(&self) -> usize {
    self.stats().total_updates
  }

  pub fn stats(&self) -> StoreStats {
    let guards = self.lock_all();
    guards.iter().fold(StoreStats::default(), |acc, shard| StoreStats {
      incidents_tracked: acc.incidents_tracked + shard.len(),
      total_updates: acc.total_updates
        + shard.values().map(|r| r.emitted_keys.len()).sum::<usize>(),
    })
  }

  /// Drop records whose `received_at` is older than `now - retention`.
  ///
  /// A window reaching past the representable time range evicts nothing.
  pub fn evict_expired(&self, now: DateTime<Utc>, retention: Duration) -> usize {
    let Some(cutoff) = now.checked_sub_signed(retention) else {
      return 0;
    };
    let mut evicted = 0;
    for i in 0..self.shards.len() {
      let mut shard = self.lock(i);
      let before = shard.len();
      shard.retain(|_, record| record.received_at >= cutoff);
      self.track(before, shard.len());
      evicted += before - shard.len();
    }
    evicted
  }

  /// Evict the least recently received records until at most `max` remain.
  ///
  /// Under the cap this only reads the record counter and takes no lock.
  pub fn enforce_capacity(&self, max: usize) -> usize {
    if self.count() <= max {
      return 0;
    }

    let mut guards = self.lock_all();
    let total: usize = guards.iter().map(|shard| shard.len()).sum();
    if total <= max {
      return 0;
    }
    let excess = total - max;

    // Max-heap holding the `excess` oldest records seen so far.
    let mut oldest: BinaryHeap<(DateTime<Utc>, usize, String)> =
      BinaryHeap::with_capacity(excess + 1);
    for (i, shard) in guards.iter().enumerate() {
      for record in shard.values() {
        let older = match oldest.peek() {
          Some((ts, j, id)) if oldest.len() == excess => {
            (record.received_at, i, record.incident_id.as_str()) < (*ts, *j, id.as_str())
          }
          _ => true,
        };
        if older {
          oldest.push((record.received_at, i, record.incident_id.clone()));
          if oldest.len() > excess {
            oldest.pop();
          }
        }
      }
    }

    for (_, i, id) in oldest {
      guards[i].remove(&id);
    }
    self.len.fetch_sub(excess, Ordering::Relaxed);
    excess
  }
}

impl Default for IncidentStore {
  fn default() -> Self {
    Self::new(1)
  }
}
