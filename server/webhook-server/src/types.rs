//! Request/response types for the webhook server.

use serde::Serialize;
use status_engine::IncidentListing;

/// Uniform acknowledgement for accepted webhooks, NEW or DUPLICATE alike.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
  pub status: &'static str,
  pub incident_id: String,
  pub message: &'static str,
}

impl WebhookAck {
  pub fn processed(incident_id: String) -> Self {
    Self {
      status: "success",
      incident_id,
      message: "Incident processed",
    }
  }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
  pub mode: &'static str,
  pub incidents_tracked: usize,
  pub total_updates: usize,
  pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct IncidentsResponse {
  pub count: usize,
  pub incidents: Vec<IncidentListing>,
}
