//! # Severity classification.
//!
//! [`classify`] is a pure, total mapping from a normalized action plus exit
//! metadata to a [`Severity`]. Anything unrecognized is INFO, so adding new
//! runtime actions never breaks classification.
//!
//! ## Rules
//! - CRITICAL: `oom`; `die` with a non-zero (or missing) exit code; `die`
//!   carrying an OOM flag regardless of exit code; `health_status` unhealthy.
//! - WARNING: `die` with exit code 0; `kill`; `restart`; `health_status`
//!   starting/ambiguous.
//! - INFO: everything else, including `start`, `create`, `stop`, `attach`,
//!   `health_status` healthy, and all unrecognized actions.
//!
//! The OOM flag takes precedence over exit-code classification: an
//! out-of-memory kill is always CRITICAL.

use std::fmt;

use super::canonical::{Action, HealthResult};

/// Alerting urgency attached to each canonical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Stable lowercase label for logs and payloads.
    pub fn as_label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Emoji used by alert formatting.
    pub fn emoji(self) -> &'static str {
        match self {
            Severity::Info => "\u{2139}\u{fe0f}",
            Severity::Warning => "\u{26a0}\u{fe0f}",
            Severity::Critical => "\u{1f534}",
        }
    }

    /// Embed color used by the webhook sink.
    pub fn color(self) -> u32 {
        match self {
            Severity::Info => 0x2ECC71,
            Severity::Warning => 0xE67E22,
            Severity::Critical => 0xE74C3C,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("INFO"),
            Severity::Warning => f.write_str("WARN"),
            Severity::Critical => f.write_str("CRIT"),
        }
    }
}

/// Fixed severities for actions whose classification needs no exit metadata.
/// Actions absent from this table default to INFO.
const ACTION_SEVERITIES: &[(&str, Severity)] = &[
    ("kill", Severity::Warning),
    ("restart", Severity::Warning),
    ("create", Severity::Info),
    ("start", Severity::Info),
    ("stop", Severity::Info),
    ("attach", Severity::Info),
    ("destroy", Severity::Info),
];

/// Classifies one event.
///
/// Total and deterministic: identical `(action, exit_code, oom_flagged)`
/// inputs always yield the same severity.
///
/// `oom_flagged` reflects an explicit OOM marker in the event's attributes
/// (some runtimes report an OOM kill as a `die` with a flag instead of a
/// dedicated `oom` action).
pub fn classify(action: &Action, exit_code: Option<i64>, oom_flagged: bool) -> Severity {
    match action {
        Action::Oom => Severity::Critical,
        Action::Die if oom_flagged => Severity::Critical,
        // missing exit code on die counts as unexplained death
        Action::Die => match exit_code {
            Some(0) => Severity::Warning,
            _ => Severity::Critical,
        },
        Action::HealthStatus(HealthResult::Unhealthy) => Severity::Critical,
        Action::HealthStatus(HealthResult::Starting) => Severity::Warning,
        Action::HealthStatus(HealthResult::Healthy) => Severity::Info,
        other => {
            let label = other.to_string();
            ACTION_SEVERITIES
                .iter()
                .find(|(name, _)| *name == label)
                .map(|(_, sev)| *sev)
                .unwrap_or(Severity::Info)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oom_is_always_critical() {
        assert_eq!(classify(&Action::Oom, None, false), Severity::Critical);
        assert_eq!(classify(&Action::Oom, Some(0), false), Severity::Critical);
        assert_eq!(classify(&Action::Oom, Some(137), true), Severity::Critical);
    }

    #[test]
    fn die_classifies_by_exit_code() {
        assert_eq!(classify(&Action::Die, Some(0), false), Severity::Warning);
        assert_eq!(classify(&Action::Die, Some(1), false), Severity::Critical);
        assert_eq!(classify(&Action::Die, Some(137), false), Severity::Critical);
        assert_eq!(classify(&Action::Die, None, false), Severity::Critical);
    }

    #[test]
    fn oom_flag_takes_precedence_over_exit_code() {
        // Even a clean exit code alerts when the runtime flagged an OOM kill.
        assert_eq!(classify(&Action::Die, Some(0), true), Severity::Critical);
    }

    #[test]
    fn health_status_results() {
        assert_eq!(
            classify(&Action::HealthStatus(HealthResult::Unhealthy), None, false),
            Severity::Critical
        );
        assert_eq!(
            classify(&Action::HealthStatus(HealthResult::Starting), None, false),
            Severity::Warning
        );
        assert_eq!(
            classify(&Action::HealthStatus(HealthResult::Healthy), None, false),
            Severity::Info
        );
    }

    #[test]
    fn kill_and_restart_warn() {
        assert_eq!(classify(&Action::Kill, None, false), Severity::Warning);
        assert_eq!(classify(&Action::Restart, None, false), Severity::Warning);
    }

    #[test]
    fn lifecycle_and_unknown_actions_are_info() {
        assert_eq!(classify(&Action::Start, None, false), Severity::Info);
        assert_eq!(classify(&Action::Create, None, false), Severity::Info);
        assert_eq!(classify(&Action::Stop, None, false), Severity::Info);
        assert_eq!(classify(&Action::Attach, None, false), Severity::Info);
        assert_eq!(
            classify(&Action::Other("exec_start: sh".into()), None, false),
            Severity::Info
        );
    }

    #[test]
    fn classification_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(classify(&Action::Die, Some(137), false), Severity::Critical);
        }
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
