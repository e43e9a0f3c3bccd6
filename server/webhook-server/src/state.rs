//! Shared state for the webhook handlers.

use std::sync::Arc;

use status_engine::Engine;

use crate::sink::{NotificationSink, StdoutSink};

pub struct AppState {
  pub engine: Engine,
  /// Where canonical notification lines go (stdout in production).
  pub sink: Arc<dyn NotificationSink>,
}

impl AppState {
  pub fn new(engine: Engine) -> Self {
    Self {
      engine,
      sink: Arc::new(StdoutSink),
    }
  }

  pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
    self.sink = sink;
    self
  }
}
