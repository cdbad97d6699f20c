//! Error types used by the stream connector and the alert sinks.
//!
//! This module defines two error enums:
//!
//! - [`StreamError`] — transport-level failures raised while connecting to or
//!   reading from the event source.
//! - [`SinkError`] — failures raised while delivering an alert.
//!
//! Both types provide `as_label` for logging, and [`StreamError`] additionally
//! provides [`StreamError::is_retryable`]. Nothing in this crate treats a
//! retryable stream error as fatal: the connector converts every one of them
//! into a backoff retry.

use thiserror::Error;

/// # Errors raised by the event-stream transport.
///
/// These cover endpoint parsing, TLS setup, connection establishment, reads,
/// and frame decoding. All of them stay inside the connector's retry loop;
/// none terminate the process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StreamError {
    /// The configured endpoint string is not a recognized form.
    #[error("invalid endpoint `{0}` (expected unix://<path> or tcp://<host>:<port>)")]
    Endpoint(String),

    /// Establishing the connection to the event source failed.
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        /// Endpoint the connection was attempted against.
        endpoint: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Building the TLS client configuration failed (missing or bad PEM
    /// material, invalid server name).
    #[error("tls configuration: {0}")]
    Tls(String),

    /// Reading from an established stream failed.
    #[error("event stream read failed: {0}")]
    Read(#[source] std::io::Error),

    /// A received frame was not valid JSON. The frame is skipped; the
    /// connection survives.
    #[error("malformed event frame: {0}")]
    Frame(#[source] serde_json::Error),
}

impl StreamError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamError::Endpoint(_) => "stream_endpoint",
            StreamError::Connect { .. } => "stream_connect",
            StreamError::Tls(_) => "stream_tls",
            StreamError::Read(_) => "stream_read",
            StreamError::Frame(_) => "stream_frame",
        }
    }

    /// Indicates whether the connector should retry after this error.
    ///
    /// Connection, read, and TLS failures are transient from the connector's
    /// point of view and feed the backoff loop. An invalid endpoint is a
    /// configuration mistake, and a malformed frame is handled by skipping
    /// the frame, not by reconnecting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::Connect { .. } | StreamError::Read(_) | StreamError::Tls(_)
        )
    }
}

/// # Errors raised by alert delivery.
///
/// Reported by sink workers and logged there; delivery failures never reach
/// the connector loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SinkError {
    /// The HTTP request could not be performed (connection, timeout, body).
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook endpoint answered with a non-success status.
    #[error("webhook returned status {status}")]
    Status {
        /// HTTP status code received from the endpoint.
        status: u16,
    },
}

impl SinkError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkError::Http(_) => "sink_http",
            SinkError::Status { .. } => "sink_status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_and_read_are_retryable() {
        let connect = StreamError::Connect {
            endpoint: "tcp://localhost:2375".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        let read = StreamError::Read(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "eof",
        ));
        assert!(connect.is_retryable());
        assert!(read.is_retryable());
    }

    #[test]
    fn endpoint_and_frame_are_not_retryable() {
        let endpoint = StreamError::Endpoint("ftp://nope".into());
        let frame = StreamError::Frame(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert!(!endpoint.is_retryable());
        assert!(!frame.is_retryable());
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(
            StreamError::Endpoint(String::new()).as_label(),
            "stream_endpoint"
        );
        assert_eq!(SinkError::Status { status: 500 }.as_label(), "sink_status");
    }
}
