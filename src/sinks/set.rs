//! # SinkSet: non-blocking fan-out over multiple alert sinks
//!
//! [`SinkSet`] distributes each [`CanonicalEvent`] to every sink **without
//! awaiting** delivery.
//!
//! ## What it guarantees
//! - `emit(&CanonicalEvent)` returns immediately.
//! - Per-sink FIFO (queue order matches arrival order).
//! - Delivery failures are logged per sink, never propagated.
//! - Panics inside sinks are caught and logged (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different sinks.
//! - No retries on per-sink queue overflow (events are dropped for that
//!   sink).
//!
//! ## Diagram
//! ```text
//!    emit(&CanonicalEvent)
//!        │                        (Arc-clone per sink)
//!        ├────────────────► [queue S1] ─► worker S1 ─► deliver()
//!        ├────────────────► [queue S2] ─► worker S2 ─► deliver()
//!        └────────────────► [queue SN] ─► worker SN ─► deliver()
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::CanonicalEvent;

use super::sink::AlertSink;

/// Per-sink channel with metadata
struct SinkChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<CanonicalEvent>>,
}

/// Composite fan-out with per-sink bounded queues and worker tasks.
pub struct SinkSet {
    channels: Vec<SinkChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SinkSet {
    /// Creates a new set and spawns one worker per sink.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        let mut channels = Vec::with_capacity(sinks.len());
        let mut workers = Vec::with_capacity(sinks.len());

        for sink in sinks {
            let cap = sink.queue_capacity().max(1);
            let name = sink.name();
            let (tx, mut rx) = mpsc::channel::<Arc<CanonicalEvent>>(cap);
            let s = Arc::clone(&sink);

            let handle = tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    let fut = s.deliver(event.as_ref());
                    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            tracing::warn!(
                                sink = s.name(),
                                error = %e,
                                label = e.as_label(),
                                "alert delivery failed"
                            );
                        }
                        Err(panic_err) => {
                            tracing::error!(
                                sink = s.name(),
                                panic = ?panic_err,
                                "sink panicked during delivery"
                            );
                        }
                    }
                }
            });

            channels.push(SinkChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fan-out one event to all sinks (non-blocking).
    ///
    /// If a sink's queue is **full** or **closed**, the event is dropped for
    /// it and a warning is logged with the sink's name.
    pub fn emit(&self, event: &CanonicalEvent) {
        let event = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(sink = channel.name, "dropped event: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(sink = channel.name, "dropped event: worker closed");
                }
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    ///
    /// In-flight deliveries finish; nothing new is accepted once the channels
    /// are dropped.
    pub async fn shutdown(self) {
        drop(self.channels);
        for handle in self.workers {
            let _ = handle.await;
        }
    }

    /// True if there are no sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}
