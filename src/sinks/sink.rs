//! # Core sink trait
//!
//! `AlertSink` is the extension point for delivering canonical events to the
//! outside world. Each sink is driven by a dedicated worker loop fed by a
//! bounded queue owned by the [`SinkSet`](crate::sinks::SinkSet).
//!
//! ## Contract
//! - Implementations may be slow (HTTP, batching, retries) — they do **not**
//!   block the event pipeline nor other sinks.
//! - A delivery failure is returned as [`SinkError`]; the worker logs it and
//!   moves on. Failures never reach the stream connector.
//! - Each sink **declares** its preferred queue capacity via
//!   [`AlertSink::queue_capacity`]. If a queue overflows, events for that
//!   sink are **dropped** (warn).

use async_trait::async_trait;

use crate::error::SinkError;
use crate::events::CanonicalEvent;

/// Contract for alert sinks.
///
/// Called from a sink-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait AlertSink: Send + Sync + 'static {
    /// Delivers a single event through this sink.
    async fn deliver(&self, event: &CanonicalEvent) -> Result<(), SinkError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this sink's queue.
    ///
    /// On overflow, events for this sink are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        256
    }
}
