//! Canonical event model produced by the normalizer.
//!
//! [`CanonicalEvent`] is the fully-defaulted internal representation of one
//! observed runtime event. Every field is populated (fields the raw record
//! did not provide hold a well-defined default), so a canonical event is
//! always safe to hand to a sink. It is immutable once constructed.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use super::severity::Severity;

/// Placeholder used for identifiers and names that could not be extracted.
pub const UNKNOWN: &str = "unknown";

/// Category of the resource an event concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Container,
    Image,
    Network,
    Volume,
    Daemon,
    /// Any category this crate does not model explicitly (lowercased).
    Other(String),
}

impl EventKind {
    /// Parses a raw type string, falling back to [`EventKind::Other`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "container" => EventKind::Container,
            "image" => EventKind::Image,
            "network" => EventKind::Network,
            "volume" => EventKind::Volume,
            "daemon" => EventKind::Daemon,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Stable lowercase label for logs and sink payloads.
    pub fn as_label(&self) -> &str {
        match self {
            EventKind::Container => "container",
            EventKind::Image => "image",
            EventKind::Network => "network",
            EventKind::Volume => "volume",
            EventKind::Daemon => "daemon",
            EventKind::Other(s) => s,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Outcome carried by a `health_status` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthResult {
    Healthy,
    Unhealthy,
    /// Health probe still starting, or a result string this crate does not
    /// recognize. Classified as ambiguous.
    Starting,
}

impl HealthResult {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "healthy" => HealthResult::Healthy,
            "unhealthy" => HealthResult::Unhealthy,
            _ => HealthResult::Starting,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            HealthResult::Healthy => "healthy",
            HealthResult::Unhealthy => "unhealthy",
            HealthResult::Starting => "starting",
        }
    }
}

/// Normalized action of an event.
///
/// Unrecognized actions are preserved verbatim (lowercased) in
/// [`Action::Other`] rather than dropped, so downstream consumers still see
/// them; they just classify as INFO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Start,
    Stop,
    Die,
    Destroy,
    Kill,
    Oom,
    Pause,
    Unpause,
    Restart,
    Attach,
    Pull,
    Push,
    Connect,
    Disconnect,
    HealthStatus(HealthResult),
    Other(String),
}

impl Action {
    /// Parses a raw action string.
    ///
    /// Health events arrive as `health_status: healthy` and similar; the
    /// result part is parsed separately. Everything unrecognized becomes
    /// [`Action::Other`] with the trimmed, lowercased original.
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        if let Some(result) = lowered.strip_prefix("health_status") {
            let result = result.trim_start_matches(':').trim();
            return Action::HealthStatus(HealthResult::parse(result));
        }
        match lowered.as_str() {
            "create" => Action::Create,
            "start" => Action::Start,
            "stop" => Action::Stop,
            "die" => Action::Die,
            "destroy" => Action::Destroy,
            "kill" => Action::Kill,
            "oom" => Action::Oom,
            "pause" => Action::Pause,
            "unpause" => Action::Unpause,
            "restart" => Action::Restart,
            "attach" => Action::Attach,
            "pull" => Action::Pull,
            "push" => Action::Push,
            "connect" => Action::Connect,
            "disconnect" => Action::Disconnect,
            _ => Action::Other(lowered),
        }
    }

    /// True for actions that describe a container terminating, where an exit
    /// code may be attached.
    pub fn is_termination(&self) -> bool {
        matches!(self, Action::Die | Action::Kill | Action::Oom)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => f.write_str("create"),
            Action::Start => f.write_str("start"),
            Action::Stop => f.write_str("stop"),
            Action::Die => f.write_str("die"),
            Action::Destroy => f.write_str("destroy"),
            Action::Kill => f.write_str("kill"),
            Action::Oom => f.write_str("oom"),
            Action::Pause => f.write_str("pause"),
            Action::Unpause => f.write_str("unpause"),
            Action::Restart => f.write_str("restart"),
            Action::Attach => f.write_str("attach"),
            Action::Pull => f.write_str("pull"),
            Action::Push => f.write_str("push"),
            Action::Connect => f.write_str("connect"),
            Action::Disconnect => f.write_str("disconnect"),
            Action::HealthStatus(r) => write!(f, "health_status: {}", r.as_label()),
            Action::Other(s) => f.write_str(s),
        }
    }
}

/// Normalized, severity-classified event.
///
/// Field invariant: nothing here is ever in a half-parsed state. Extraction
/// failures degrade to [`UNKNOWN`] placeholders or `None`, and the
/// accompanying diagnostics record what was absorbed.
#[derive(Debug, Clone)]
pub struct CanonicalEvent {
    /// Resource category (container, image, ...).
    pub kind: EventKind,
    /// Normalized action.
    pub action: Action,
    /// Stable identifier of the subject; [`UNKNOWN`] when unextractable.
    pub actor_id: String,
    /// Human-readable name; [`UNKNOWN`] when unextractable.
    pub actor_name: String,
    /// Image reference, when the event carries one.
    pub image: Option<String>,
    /// Exit code for termination-class actions, when extractable.
    pub exit_code: Option<i64>,
    /// Event occurrence time from the raw record, else time of receipt.
    pub timestamp: DateTime<Utc>,
    /// Alerting urgency, computed by the classifier. Never absent.
    pub severity: Severity,
    /// Raw actor attributes that survived extraction (labels, flags).
    pub attributes: HashMap<String, String>,
}

impl CanonicalEvent {
    /// Short identifier for display (runtimes use long hex ids).
    pub fn short_id(&self) -> &str {
        let end = self
            .actor_id
            .char_indices()
            .nth(12)
            .map_or(self.actor_id.len(), |(i, _)| i);
        &self.actor_id[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse_maps_known_categories() {
        assert_eq!(EventKind::parse("container"), EventKind::Container);
        assert_eq!(EventKind::parse(" Image "), EventKind::Image);
        assert_eq!(
            EventKind::parse("plugin"),
            EventKind::Other("plugin".into())
        );
    }

    #[test]
    fn action_parse_maps_known_actions() {
        assert_eq!(Action::parse("die"), Action::Die);
        assert_eq!(Action::parse(" START "), Action::Start);
        assert_eq!(
            Action::parse("exec_create: sh"),
            Action::Other("exec_create: sh".into())
        );
    }

    #[test]
    fn action_parse_splits_health_status() {
        assert_eq!(
            Action::parse("health_status: healthy"),
            Action::HealthStatus(HealthResult::Healthy)
        );
        assert_eq!(
            Action::parse("health_status: unhealthy"),
            Action::HealthStatus(HealthResult::Unhealthy)
        );
        assert_eq!(
            Action::parse("health_status"),
            Action::HealthStatus(HealthResult::Starting)
        );
    }

    #[test]
    fn termination_actions() {
        assert!(Action::Die.is_termination());
        assert!(Action::Kill.is_termination());
        assert!(Action::Oom.is_termination());
        assert!(!Action::Start.is_termination());
        assert!(!Action::HealthStatus(HealthResult::Unhealthy).is_termination());
    }

    #[test]
    fn display_round_trips_labels() {
        assert_eq!(Action::Die.to_string(), "die");
        assert_eq!(
            Action::HealthStatus(HealthResult::Unhealthy).to_string(),
            "health_status: unhealthy"
        );
        assert_eq!(Action::Other("weird".into()).to_string(), "weird");
    }
}
