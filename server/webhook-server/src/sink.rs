//! Output sinks for canonical notification lines.

use std::io::Write;

pub trait NotificationSink: Send + Sync {
  fn emit(&self, line: &str);
}

/// Writes each notification framed by blank lines, flushed immediately so
/// log scrapers see it without buffering delay.
pub struct StdoutSink;

impl NotificationSink for StdoutSink {
  fn emit(&self, line: &str) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = writeln!(out, "\n{}\n", line).and_then(|_| out.flush()) {
      tracing::error!(error = %e, "failed to write notification to stdout");
    }
  }
}
