//! Structured error types for payload normalization.

use thiserror::Error;

/// The only failure class of the core: the payload cannot become an `IncidentEvent`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
  #[error("missing required field: {field}")]
  MissingField { field: String },

  #[error("{field}: expected a JSON object, got {kind}")]
  NotAnObject { field: String, kind: &'static str },
}

impl NormalizeError {
  pub fn missing(field: &str) -> Self {
    Self::MissingField {
      field: field.to_string(),
    }
  }

  pub fn not_an_object(field: &str, kind: &'static str) -> Self {
    Self::NotAnObject {
      field: field.to_string(),
      kind,
    }
  }

  /// Dotted path of the offending field (`"$"` for the payload root).
  pub fn field(&self) -> &str {
    match self {
      Self::MissingField { field } | Self::NotAnObject { field, .. } => field,
    }
  }
}
