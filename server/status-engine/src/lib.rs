//! Status Page Webhook Engine: event-driven incident ingestion (no polling).
//!
//! Normalizes provider webhook payloads into canonical incident events,
//! suppresses repeated deliveries of the same `(incident_id, updated_at)`
//! update, and renders one notification line per genuinely new update.
//!
//! No network, no DB; pure computation + in-memory state.

pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod format;
pub mod key;
pub mod normalize;
pub mod store;
pub mod types;

pub use config::{Config, UpdateSelection};
pub use engine::Engine;
pub use error::NormalizeError;
pub use store::IncidentStore;
pub use types::{Decision, IncidentEvent, IncidentListing, Outcome, StoreStats};
