//! Canonical notification line for downstream log scrapers.

use crate::types::IncidentEvent;

/// Render a NEW event:
///
/// ```text
/// [YYYY-MM-DD HH:MM:SS] Product: <provider> - <component, component>
/// Status: <message>
/// ```
///
/// The timestamp is the provider's wall-clock time, truncated to seconds,
/// with no zone suffix. Empty fields render as empty segments.
pub fn format_notification(event: &IncidentEvent) -> String {
  format!(
    "[{}] Product: {} - {}\nStatus: {}",
    event.updated_at.format("%Y-%m-%d %H:%M:%S"),
    event.provider_page_name,
    event.component_names.join(", "),
    event.message
  )
}
