//! # dockwatch
//!
//! **dockwatch** watches a container runtime's live event stream and turns
//! each raw, loosely-structured event into a normalized, severity-classified
//! alert.
//!
//! ## Architecture
//! ```text
//!   ┌─────────────────────┐      ┌──────────────────────────────────────┐
//!   │  Raw Event Source   │      │  Connector (retry loop)              │
//!   │  unix:// or tcp://  │─────►│  - EventTransport (NDJSON framing)   │
//!   │  (optional TLS)     │      │  - BackoffPolicy + JitterPolicy      │
//!   └─────────────────────┘      │  - ConnectionState machine           │
//!                                └──────────────┬───────────────────────┘
//!                                               │ RawEvent (in order)
//!                                               ▼
//!                                ┌──────────────────────────────────────┐
//!                                │  normalize() (pure, never fails)     │
//!                                │  - defensive field extraction        │
//!                                │  - Diagnostic per absorbed anomaly   │
//!                                │  - classify() → Severity             │
//!                                └──────────────┬───────────────────────┘
//!                                               │ CanonicalEvent
//!                                               ▼
//!                                ┌──────────────────────────────────────┐
//!                                │  SinkSet (per-sink queue + worker)   │
//!                                │    ├─► LogSink     (tracing)         │
//!                                │    └─► WebhookSink (embed POST)      │
//!                                └──────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//! loop {
//!   ├─► connect (unix / tcp / tls)          ── cancellable
//!   │     ├─ Ok  ──► attempt = 0, stream frames
//!   │     │           ├─ frame      ─► RawEvent ─► normalize ─► sinks
//!   │     │           ├─ bad frame  ─► warn, skip, keep reading
//!   │     │           └─ disconnect ─► backoff sleep ── cancellable
//!   │     └─ Err ──► backoff sleep (first × 2^attempt, capped) ── cancellable
//!   └─ exit condition: shutdown token cancelled (the only one)
//! }
//! ```
//!
//! Transient failures never end the process: the only observable effect of a
//! runtime outage is a gap in alerts. The only process-ending event is an
//! explicit shutdown signal, which interrupts any pending connect, read, or
//! sleep, releases the connection, and lets in-flight deliveries finish.
//!
//! ## Features
//! | Area           | Description                                        | Key types / functions                  |
//! |----------------|----------------------------------------------------|----------------------------------------|
//! | **Streaming**  | Connection lifecycle, reconnect with backoff.      | [`Connector`], [`BackoffPolicy`]       |
//! | **Normalizing**| Defensive mapping of raw events, diagnostics.      | [`normalize`], [`CanonicalEvent`]      |
//! | **Severity**   | Total classification of (action, exit metadata).   | [`classify`], [`Severity`]             |
//! | **Sinks**      | Fan-out alert delivery (log, webhook).             | [`AlertSink`], [`SinkSet`]             |
//! | **Config**     | Environment-resolved settings.                     | [`Config`]                             |
//! | **Shutdown**   | OS-signal driven cancellation.                     | [`wait_for_shutdown_signal`]           |

mod agent;
mod config;
mod error;
mod events;
mod shutdown;
mod sinks;
mod stream;

// ---- Public re-exports ----

pub use agent::Agent;
pub use config::{Config, TlsConfig, DEFAULT_HOST};
pub use error::{SinkError, StreamError};
pub use events::{
    classify, normalize, Action, CanonicalEvent, Diagnostic, EventKind, HealthResult, Normalized,
    RawEvent, Severity, UNKNOWN,
};
pub use shutdown::wait_for_shutdown_signal;
pub use sinks::{AlertSink, LogSink, SinkSet, WebhookSink};
pub use stream::{BackoffPolicy, ConnectionState, Connector, Endpoint, JitterPolicy};
