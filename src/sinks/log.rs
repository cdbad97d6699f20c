//! # LogSink — structured-log alert sink
//!
//! Writes every canonical event to the process log at a level matching its
//! severity. Always configured, so an unreachable webhook never means a
//! silent event.

use async_trait::async_trait;

use crate::error::SinkError;
use crate::events::{CanonicalEvent, Severity};

use super::sink::AlertSink;

/// Alert sink backed by `tracing`.
#[derive(Default)]
pub struct LogSink;

impl LogSink {
    /// Construct a new [`LogSink`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, event: &CanonicalEvent) -> Result<(), SinkError> {
        match event.severity {
            Severity::Critical => tracing::error!(
                kind = event.kind.as_label(),
                action = %event.action,
                id = event.short_id(),
                name = %event.actor_name,
                exit_code = event.exit_code,
                "container runtime event"
            ),
            Severity::Warning => tracing::warn!(
                kind = event.kind.as_label(),
                action = %event.action,
                id = event.short_id(),
                name = %event.actor_name,
                exit_code = event.exit_code,
                "container runtime event"
            ),
            Severity::Info => tracing::info!(
                kind = event.kind.as_label(),
                action = %event.action,
                id = event.short_id(),
                name = %event.actor_name,
                "container runtime event"
            ),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
