//! # Agent: wires the connector, the normalizer, and the sinks.
//!
//! The agent owns one pipeline invocation end to end:
//!
//! ```text
//! Connector ──raw──► normalize() ──canonical──► SinkSet::emit()
//!     │                  │                          │
//!     │ (cancellable)    │ (pure)                   │ (per-sink queues)
//!     ▼                  ▼                          ▼
//!  retry loop      diagnostics → debug log     workers → deliver()
//! ```
//!
//! ## Rules
//! - Events are normalized and emitted in arrival order; there is no
//!   batching or reordering before the sink set.
//! - Normalization diagnostics are logged, never fatal.
//! - On cancellation the agent stops pulling from the stream immediately,
//!   then drains the sink workers so in-flight deliveries complete.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::events::normalize;
use crate::sinks::{AlertSink, SinkSet};
use crate::stream::Connector;

/// Drives one watch-normalize-dispatch pipeline until shutdown.
pub struct Agent {
    config: Config,
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl Agent {
    /// Creates an agent from resolved configuration and the sinks to notify.
    pub fn new(config: Config, sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { config, sinks }
    }

    /// Runs until the token is cancelled (or the stream ends, which only
    /// happens on cancellation). Consumes the agent: one run per process.
    pub async fn run(self, token: CancellationToken) {
        let set = SinkSet::new(self.sinks);
        let connector = Connector::new(
            self.config.endpoint.clone(),
            self.config.tls.clone(),
            self.config.backoff,
            token.clone(),
        );
        let mut events = connector.watch();

        loop {
            let raw = tokio::select! {
                raw = events.recv() => raw,
                _ = token.cancelled() => break,
            };
            let Some(raw) = raw else { break };

            let normalized = normalize(&raw, Utc::now());
            for issue in &normalized.issues {
                tracing::debug!(
                    field = issue.field,
                    problem = %issue.problem,
                    "normalization degraded a field"
                );
            }
            tracing::trace!(
                action = %normalized.event.action,
                severity = normalized.event.severity.as_label(),
                "dispatching event"
            );
            set.emit(&normalized.event);
        }

        set.shutdown().await;
        tracing::info!("agent stopped");
    }
}
