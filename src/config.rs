//! # Runtime configuration.
//!
//! [`Config`] centralizes every setting the watcher consumes: the event
//! source endpoint, TLS material, reconnection backoff, the alert webhook,
//! and log verbosity. Values are resolved from environment variables by
//! [`Config::from_env`]; the core components receive them as plain values.
//!
//! ## Environment variables
//! | Variable                          | Default                             |
//! |-----------------------------------|-------------------------------------|
//! | `DOCKER_HOST`                     | `unix:///var/run/docker.sock`       |
//! | `DOCKER_TLS`                      | unset (TLS off)                     |
//! | `DOCKER_TLS_VERIFY`               | unset (no verification)             |
//! | `DOCKER_CERT_PATH`                | empty                               |
//! | `ALERT_WEBHOOK_URL`               | unset (log-only alerts)             |
//! | `HTTP_TIMEOUT_SECONDS`            | `5`                                 |
//! | `DOCKWATCH_BACKOFF_FIRST_SECONDS` | `1`                                 |
//! | `DOCKWATCH_BACKOFF_MAX_SECONDS`   | `60`                                |
//! | `LOG_LEVEL`                       | `info`                              |
//!
//! Setting `DOCKER_TLS_VERIFY` implies TLS with mutual authentication from
//! `DOCKER_CERT_PATH` (`ca.pem`, `cert.pem`, `key.pem`). Setting only
//! `DOCKER_TLS` negotiates TLS but accepts any server certificate.
//!
//! Misconfiguration that is survivable (TCP without TLS, no webhook URL) is
//! reported by [`Config::startup_warnings`], never treated as fatal.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::StreamError;
use crate::stream::{BackoffPolicy, Endpoint};

/// Default event-source endpoint.
pub const DEFAULT_HOST: &str = "unix:///var/run/docker.sock";

/// TLS settings for a TCP event-source endpoint.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Directory holding `ca.pem`, `cert.pem`, and `key.pem`.
    pub cert_dir: PathBuf,
    /// When true, verify the server against the CA bundle and present the
    /// client certificate (mutual TLS). When false, accept any server
    /// certificate.
    pub verify: bool,
}

/// Resolved configuration for one watcher process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Event-source endpoint.
    pub endpoint: Endpoint,
    /// TLS settings; `None` for plaintext transports.
    pub tls: Option<TlsConfig>,
    /// Reconnection backoff policy.
    pub backoff: BackoffPolicy,
    /// Alert webhook URL; `None` means alerts are only logged.
    pub webhook_url: Option<String>,
    /// Per-request timeout for outbound HTTP.
    pub http_timeout: Duration,
    /// Log verbosity directive (`tracing` filter syntax).
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Unix(PathBuf::from("/var/run/docker.sock")),
            tls: None,
            backoff: BackoffPolicy::default(),
            webhook_url: None,
            http_timeout: Duration::from_secs(5),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Resolves the configuration from environment variables.
    ///
    /// The only fatal outcome is an endpoint string that cannot be parsed;
    /// every other oddity falls back to a default.
    pub fn from_env() -> Result<Self, StreamError> {
        let host = env_string("DOCKER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let endpoint = Endpoint::parse(&host)?;

        let tls_enabled = env_flag("DOCKER_TLS");
        let tls_verify = env_flag("DOCKER_TLS_VERIFY");
        let tls = (tls_enabled || tls_verify).then(|| TlsConfig {
            cert_dir: PathBuf::from(env_string("DOCKER_CERT_PATH").unwrap_or_default()),
            verify: tls_verify,
        });

        let backoff = BackoffPolicy {
            first: env_seconds("DOCKWATCH_BACKOFF_FIRST_SECONDS", 1),
            max: env_seconds("DOCKWATCH_BACKOFF_MAX_SECONDS", 60),
            ..BackoffPolicy::default()
        };

        Ok(Self {
            endpoint,
            tls,
            backoff,
            webhook_url: env_string("ALERT_WEBHOOK_URL"),
            http_timeout: env_seconds("HTTP_TIMEOUT_SECONDS", 5),
            log_filter: env_string("LOG_LEVEL")
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Survivable misconfiguration worth a log line at startup.
    pub fn startup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if matches!(self.endpoint, Endpoint::Tcp { .. }) && self.tls.is_none() {
            warnings.push(
                "event source is TCP without TLS; this is insecure outside development".to_string(),
            );
        }
        if let Some(tls) = &self.tls {
            if matches!(self.endpoint, Endpoint::Unix(_)) {
                warnings.push("TLS settings are ignored for unix socket endpoints".to_string());
            } else if tls.verify && tls.cert_dir.as_os_str().is_empty() {
                warnings.push(
                    "DOCKER_TLS_VERIFY is set but DOCKER_CERT_PATH is empty; connects will fail \
                     until certificates are provided"
                        .to_string(),
                );
            }
        }
        if self.webhook_url.is_none() {
            warnings
                .push("ALERT_WEBHOOK_URL is not configured; alerts will only be logged".to_string());
        }
        warnings
    }
}

/// Non-empty value of an environment variable.
fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Truthy flag: `1` or `true` (any case).
fn env_flag(name: &str) -> bool {
    env_string(name).is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true"))
}

/// Duration in whole seconds, with a default for unset or unparseable values.
fn env_seconds(name: &str, default: u64) -> Duration {
    let secs = env_string(name)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}
