//! # Stream connector: connection lifecycle and retry loop.
//!
//! [`Connector`] owns the connection to the raw event source and drives an
//! explicit state machine:
//!
//! ```text
//! DISCONNECTED ──► CONNECTING ──► STREAMING ──► (read error / peer close)
//!       ▲               │              │                  │
//!       │               │ cancel       │ cancel           ▼
//!       │               ▼              ▼            DISCONNECTED
//!       │            CLOSING ◄──── CLOSING                │
//!       │                                                 │ backoff sleep
//!       └─────────────────────────────────────────────────┘ (cancellable)
//! ```
//!
//! ## Rules
//! - Transport errors never escape the loop; every one becomes a backoff
//!   retry. There is no bound on attempts; the watcher outlives transient
//!   runtime restarts.
//! - The attempt counter resets to zero on every successful connection, so
//!   an outage after a long healthy period starts again at the first delay.
//! - Every suspension point (connect, read, sleep) selects on the
//!   cancellation token; a shutdown request ends the sequence cleanly from
//!   any of them.
//! - A malformed frame is skipped with a warning; the connection survives.
//! - The sequence also ends when the consumer drops the receiving end.

use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::TlsConfig;
use crate::events::RawEvent;

use super::backoff::BackoffPolicy;
use super::transport::{Endpoint, EventTransport};

/// Capacity of the channel between the connector and its consumer.
const STREAM_BUFFER: usize = 256;

/// Lifecycle state of the connection to the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Streaming,
    Closing,
}

impl ConnectionState {
    /// Stable lowercase label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Closing => "closing",
        }
    }
}

/// Owns the event-source connection, yielding raw events until shutdown.
///
/// A connector is single-use: [`Connector::watch`] consumes it, and the
/// sequence it produces is not restartable; construct a new connector to
/// watch again.
pub struct Connector {
    endpoint: Endpoint,
    tls: Option<TlsConfig>,
    backoff: BackoffPolicy,
    token: CancellationToken,
    state: ConnectionState,
    attempt: u32,
}

impl Connector {
    /// Creates a connector for the given endpoint.
    ///
    /// `token` is the process-wide shutdown capability; the connector only
    /// observes it, it never triggers it.
    pub fn new(
        endpoint: Endpoint,
        tls: Option<TlsConfig>,
        backoff: BackoffPolicy,
        token: CancellationToken,
    ) -> Self {
        Self {
            endpoint,
            tls,
            backoff,
            token,
            state: ConnectionState::Disconnected,
            attempt: 0,
        }
    }

    /// Starts watching and returns the lazy, effectively infinite sequence of
    /// raw events.
    ///
    /// The channel closes when the shutdown token fires or the receiver is
    /// dropped; both are normal termination, not errors.
    pub fn watch(self) -> mpsc::Receiver<RawEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(self.run(tx));
        rx
    }

    async fn run(mut self, tx: mpsc::Sender<RawEvent>) {
        loop {
            if self.token.is_cancelled() {
                break;
            }
            self.transition(ConnectionState::Connecting);

            let transport = tokio::select! {
                res = EventTransport::connect(&self.endpoint, self.tls.as_ref()) => res,
                _ = self.token.cancelled() => break,
            };
            let transport = match transport {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        error = %e,
                        attempt = self.attempt,
                        "connect to event source failed"
                    );
                    if !self.pause_before_retry().await {
                        break;
                    }
                    continue;
                }
            };

            self.attempt = 0;
            self.transition(ConnectionState::Streaming);
            tracing::info!(endpoint = %self.endpoint, "event stream open");

            if !self.stream_events(transport, &tx).await {
                break;
            }
            self.transition(ConnectionState::Disconnected);
            if !self.pause_before_retry().await {
                break;
            }
        }

        self.transition(ConnectionState::Closing);
        tracing::info!(endpoint = %self.endpoint, "event stream closed");
    }

    /// Reads frames until disconnect, cancellation, or consumer hang-up.
    /// Returns `true` when the loop should reconnect.
    async fn stream_events(
        &mut self,
        mut transport: EventTransport,
        tx: &mpsc::Sender<RawEvent>,
    ) -> bool {
        loop {
            let line = tokio::select! {
                line = transport.next_line() => line,
                _ = self.token.cancelled() => return false,
            };
            match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match RawEvent::from_line(line) {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                tracing::debug!("event consumer dropped; stopping watch");
                                return false;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "skipping malformed event frame");
                        }
                    }
                }
                Ok(None) => {
                    tracing::warn!(endpoint = %self.endpoint, "event stream closed by peer");
                    return true;
                }
                Err(e) => {
                    tracing::warn!(endpoint = %self.endpoint, error = %e, "event stream read failed");
                    return true;
                }
            }
        }
    }

    /// Sleeps for the next backoff delay, cancellably.
    /// Returns `false` when shutdown was requested during the sleep.
    async fn pause_before_retry(&mut self) -> bool {
        self.transition(ConnectionState::Disconnected);
        let delay = self.backoff.next(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        tracing::info!(
            delay_ms = delay.as_millis() as u64,
            attempt = self.attempt,
            "reconnecting to event source after backoff"
        );
        tokio::select! {
            _ = time::sleep(delay) => true,
            _ = self.token.cancelled() => false,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!(
                from = self.state.as_label(),
                to = next.as_label(),
                "connection state"
            );
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_labels_are_stable() {
        assert_eq!(ConnectionState::Disconnected.as_label(), "disconnected");
        assert_eq!(ConnectionState::Connecting.as_label(), "connecting");
        assert_eq!(ConnectionState::Streaming.as_label(), "streaming");
        assert_eq!(ConnectionState::Closing.as_label(), "closing");
    }
}
