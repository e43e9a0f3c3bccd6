//! Normalize provider webhook payloads into canonical IncidentEvent models.
//!
//! Payloads are not schema-guaranteed, so every accessor here is total: a
//! missing or mistyped field degrades to a default. `incident.id` is the one
//! exception.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::config::{Config, UpdateSelection};
use crate::error::NormalizeError;
use crate::types::IncidentEvent;

const UNKNOWN_STATUS: &str = "unknown";
const UNKNOWN_COMPONENT: &str = "Unknown";
const UNKNOWN_INCIDENT_NAME: &str = "Unknown Incident";

/// Parse and normalize a webhook payload into a canonical IncidentEvent.
///
/// `now` is the receipt time. It stands in for a missing `incident.updated_at`,
/// and is the display time for one that cannot be read; the latter keeps its
/// provider text in `updated_at_raw` so redeliveries still share a dedup key.
pub fn normalize(
  payload: &Value,
  config: &Config,
  now: DateTime<Utc>,
) -> Result<IncidentEvent, NormalizeError> {
  let root = payload
    .as_object()
    .ok_or_else(|| NormalizeError::not_an_object("$", kind_of(payload)))?;

  let incident = match root.get("incident") {
    None | Some(Value::Null) => return Err(NormalizeError::missing("incident.id")),
    Some(Value::Object(map)) => map,
    Some(other) => return Err(NormalizeError::not_an_object("incident", kind_of(other))),
  };

  let incident_id = id_at(incident, "id").ok_or_else(|| NormalizeError::missing("incident.id"))?;

  let provider_page_name = root
    .get("page")
    .and_then(Value::as_object)
    .and_then(|page| text_at(page, "name"))
    .map(str::to_string)
    .unwrap_or_else(|| config.unknown_provider_name.clone());

  let (updated_at, updated_at_raw) = match incident.get("updated_at") {
    None | Some(Value::Null) => (now.fixed_offset(), None),
    Some(raw) => match timestamp_value(raw) {
      Some(ts) => (ts, None),
      None => {
        tracing::warn!(
          incident_id = %incident_id,
          updated_at = %raw,
          "unreadable incident.updated_at; keying on provider text"
        );
        let text = match raw {
          Value::String(s) => s.trim().to_string(),
          other => other.to_string(),
        };
        (now.fixed_offset(), Some(text))
      }
    },
  };

  Ok(IncidentEvent {
    provider_page_name,
    incident_name: text_at(incident, "name")
      .unwrap_or(UNKNOWN_INCIDENT_NAME)
      .to_string(),
    component_names: component_names(incident),
    status: text_at(incident, "status")
      .unwrap_or(UNKNOWN_STATUS)
      .to_string(),
    updated_at,
    updated_at_raw,
    message: latest_message(incident, config.latest_update),
    incident_id,
  })
}

/// Read a JSON `updated_at`: timestamp strings, or integer epoch seconds.
fn timestamp_value(v: &Value) -> Option<DateTime<FixedOffset>> {
  match v {
    Value::String(s) => parse_timestamp(s),
    Value::Number(n) => n.as_i64().and_then(epoch_seconds),
    _ => None,
  }
}

fn epoch_seconds(secs: i64) -> Option<DateTime<FixedOffset>> {
  DateTime::from_timestamp(secs, 0).map(|ts| ts.fixed_offset())
}

/// Parse a provider timestamp.
///
/// Accepted, in order: RFC 3339, ISO-8601 with a colon-less offset
/// (`.000-0700`, `+0000`), RFC 2822, naive ISO-8601 read as UTC, and a
/// string of epoch seconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
  let s = s.trim();
  if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
    return Some(ts);
  }
  let with_offset = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"]
    .iter()
    .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok());
  if with_offset.is_some() {
    return with_offset;
  }
  if let Ok(ts) = DateTime::parse_from_rfc2822(s) {
    return Some(ts);
  }
  let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok());
  if let Some(naive) = naive {
    return Some(Utc.from_utc_datetime(&naive).fixed_offset());
  }
  if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
    return s.parse().ok().and_then(epoch_seconds);
  }
  None
}

fn kind_of(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

/// Non-blank string field, trimmed.
fn text_at<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
  map
    .get(key)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
}

/// Identifier field: providers send either strings or integers.
fn id_at(map: &Map<String, Value>, key: &str) -> Option<String> {
  match map.get(key)? {
    Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn component_names(incident: &Map<String, Value>) -> Vec<String> {
  let Some(components) = incident.get("components").and_then(Value::as_array) else {
    return Vec::new();
  };

  let mut names: Vec<String> = Vec::with_capacity(components.len());
  for component in components {
    let name = match component {
      Value::Object(map) => text_at(map, "name").unwrap_or(UNKNOWN_COMPONENT),
      Value::String(s) if !s.trim().is_empty() => s.trim(),
      _ => UNKNOWN_COMPONENT,
    };
    if !names.iter().any(|n| n == name) {
      names.push(name.to_string());
    }
  }
  names
}

fn latest_message(incident: &Map<String, Value>, selection: UpdateSelection) -> String {
  let Some(updates) = incident.get("incident_updates").and_then(Value::as_array) else {
    return String::new();
  };

  let chosen = match selection {
    UpdateSelection::First => updates.first(),
    UpdateSelection::NewestByTimestamp => newest_update(updates).or_else(|| updates.first()),
  };

  chosen
    .and_then(|u| u.get("body"))
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string()
}

/// Update with the greatest parseable timestamp; earliest position wins ties.
fn newest_update(updates: &[Value]) -> Option<&Value> {
  let mut best: Option<(DateTime<FixedOffset>, &Value)> = None;
  for update in updates {
    let ts = ["updated_at", "created_at", "display_at"]
      .iter()
      .find_map(|k| update.get(*k).and_then(Value::as_str).and_then(parse_timestamp));
    if let Some(ts) = ts {
      if best.map_or(true, |(current, _)| ts > current) {
        best = Some((ts, update));
      }
    }
  }
  best.map(|(_, update)| update)
}
