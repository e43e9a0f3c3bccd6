//! HTTP handlers for the webhook server.

use axum::body::Bytes;
use axum::{extract::State, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{HealthResponse, IncidentsResponse, WebhookAck};

pub const MODE: &str = "event-based (webhooks)";

/// Primary endpoint: a provider pushes one incident update.
pub async fn statuspage_webhook(
  State(state): State<Arc<AppState>>,
  body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
  let payload = decode_payload(&body)?;
  process(&state, &payload)
}

/// Local smoke test: synthesize an incident and run it through the pipeline.
pub async fn test_webhook(State(state): State<Arc<AppState>>) -> Result<Json<WebhookAck>, ApiError> {
  tracing::info!("test webhook received");
  process(&state, &test_payload(Utc::now()))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
  let stats = state.engine.stats();
  Json(HealthResponse {
    status: "running",
    mode: MODE,
    incidents_tracked: stats.incidents_tracked,
    total_updates: stats.total_updates,
    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
  })
}

pub async fn list_incidents(State(state): State<Arc<AppState>>) -> Json<IncidentsResponse> {
  let incidents = state.engine.incidents();
  Json(IncidentsResponse {
    count: incidents.len(),
    incidents,
  })
}

fn process(state: &AppState, payload: &Value) -> Result<Json<WebhookAck>, ApiError> {
  let outcome = state.engine.process(payload)?;
  if let Some(line) = &outcome.notification {
    state.sink.emit(line);
  }
  Ok(Json(WebhookAck::processed(outcome.incident_id)))
}

/// Decode the raw body; empty bodies, `null` and `{}` count as no payload.
fn decode_payload(body: &[u8]) -> Result<Value, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Err(ApiError::NoPayload);
  }
  let payload: Value = serde_json::from_slice(body)?;
  match &payload {
    Value::Null => Err(ApiError::NoPayload),
    Value::Object(map) if map.is_empty() => Err(ApiError::NoPayload),
    _ => Ok(payload),
  }
}

pub fn test_payload(now: DateTime<Utc>) -> Value {
  let stamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);
  json!({
    "incident": {
      "id": format!("test_{}", now.format("%Y%m%d%H%M%S")),
      "name": "Test Incident - System Check",
      "status": "investigating",
      "created_at": stamp,
      "updated_at": stamp,
      "components": [{"name": "Test Service"}],
      "incident_updates": [{
        "body": "This is a test webhook to verify the system is working"
      }]
    },
    "page": {"name": "OpenAI API"}
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn decode_rejects_empty_bodies() {
    assert!(matches!(decode_payload(b""), Err(ApiError::NoPayload)));
    assert!(matches!(decode_payload(b"  \n"), Err(ApiError::NoPayload)));
    assert!(matches!(decode_payload(b"null"), Err(ApiError::NoPayload)));
    assert!(matches!(decode_payload(b"{}"), Err(ApiError::NoPayload)));
  }

  #[test]
  fn decode_reports_malformed_json() {
    assert!(matches!(decode_payload(b"{\"incident\":"), Err(ApiError::InvalidJson(_))));
  }

  #[test]
  fn decode_passes_non_objects_through_to_normalizer() {
    assert_eq!(decode_payload(b"[1]").unwrap(), json!([1]));
  }

  #[test]
  fn test_payload_is_stamped_with_now() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 14, 32, 5).unwrap();
    let payload = test_payload(now);
    assert_eq!(payload["incident"]["id"], "test_20251103143205");
    assert_eq!(payload["incident"]["updated_at"], "2025-11-03T14:32:05.000000Z");
    assert_eq!(payload["page"]["name"], "OpenAI API");
  }
}
