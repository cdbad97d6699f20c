//! # Defensive normalization of raw runtime events.
//!
//! [`normalize`] maps one [`RawEvent`] into exactly one [`CanonicalEvent`].
//! It is pure (the receipt time is an argument, not a clock read), stateless,
//! and never fails: every extraction step is individually guarded, and any
//! unexpected shape degrades to a default plus a recorded [`Diagnostic`].
//!
//! ## Extraction pipeline
//! ```text
//! RawEvent ──► kind        (Type/type, default: unknown category)
//!          ──► action      (Action/action/status, default: "unknown")
//!          ──► actor id    (id/ID, Actor.ID, attribute fallbacks)
//!          ──► actor name  (attributes name/container)
//!          ──► image       (attributes image/image.name)
//!          ──► exit code   (termination actions only; tolerant of strings)
//!          ──► timestamp   (time/timeNano/timestamp, else receipt time)
//!          ──► severity    (classifier, total)
//! ```
//!
//! One raw event in ⇒ exactly one canonical event out, degraded if
//! necessary. Never zero, never a panic.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::canonical::{Action, CanonicalEvent, EventKind, UNKNOWN};
use super::raw::RawEvent;
use super::severity::classify;

/// One absorbed anomaly: the field that degraded and what was wrong with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Logical field that could not be extracted cleanly.
    pub field: &'static str,
    /// Short description of the unexpected shape.
    pub problem: String,
}

impl Diagnostic {
    fn new(field: &'static str, problem: impl Into<String>) -> Self {
        Self {
            field,
            problem: problem.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Result of normalizing one raw event: the canonical event plus every
/// diagnostic collected while extracting it.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub event: CanonicalEvent,
    pub issues: Vec<Diagnostic>,
}

/// Per-field extraction outcome: the value to use, and the diagnostic that
/// explains the degradation when the raw record did not cooperate.
struct Extracted<T> {
    value: T,
    issue: Option<Diagnostic>,
}

impl<T> Extracted<T> {
    fn found(value: T) -> Self {
        Self { value, issue: None }
    }

    fn defaulted(value: T, issue: Diagnostic) -> Self {
        Self {
            value,
            issue: Some(issue),
        }
    }
}

/// Normalizes one raw event.
///
/// `received_at` is the fallback timestamp when the record carries none; the
/// caller captures it at receipt so this function stays pure.
pub fn normalize(raw: &RawEvent, received_at: DateTime<Utc>) -> Normalized {
    let mut issues = Vec::new();

    let kind = collect(extract_kind(raw), &mut issues);
    let action = collect(extract_action(raw), &mut issues);
    let attributes = extract_attributes(raw);
    let actor_id = collect(extract_actor_id(raw, &attributes), &mut issues);
    let actor_name = extract_actor_name(&attributes);
    let image = extract_image(&attributes);
    let exit_code = if action.is_termination() {
        collect(extract_exit_code(raw, &attributes), &mut issues)
    } else {
        None
    };
    let timestamp = collect(extract_timestamp(raw, received_at), &mut issues);

    let oom_flagged = attributes
        .get("oom")
        .or_else(|| attributes.get("OOMKilled"))
        .is_some_and(|v| matches!(v.as_str(), "true" | "1" | "True"));

    let severity = classify(&action, exit_code, oom_flagged);

    Normalized {
        event: CanonicalEvent {
            kind,
            action,
            actor_id,
            actor_name,
            image,
            exit_code,
            timestamp,
            severity,
            attributes,
        },
        issues,
    }
}

fn collect<T>(extracted: Extracted<T>, issues: &mut Vec<Diagnostic>) -> T {
    if let Some(issue) = extracted.issue {
        issues.push(issue);
    }
    extracted.value
}

fn extract_kind(raw: &RawEvent) -> Extracted<EventKind> {
    match raw.str_field(&["Type", "type"]) {
        Some(s) => Extracted::found(EventKind::parse(s)),
        None => Extracted::defaulted(
            EventKind::Other(UNKNOWN.to_string()),
            Diagnostic::new("type", "missing or not a string"),
        ),
    }
}

fn extract_action(raw: &RawEvent) -> Extracted<Action> {
    match raw.str_field(&["Action", "action", "status"]) {
        Some(s) if !s.trim().is_empty() => Extracted::found(Action::parse(s)),
        Some(_) => Extracted::defaulted(
            Action::Other(UNKNOWN.to_string()),
            Diagnostic::new("action", "empty string"),
        ),
        None => Extracted::defaulted(
            Action::Other(UNKNOWN.to_string()),
            Diagnostic::new("action", "missing or not a string"),
        ),
    }
}

/// Flattens the actor attribute map to strings, keeping only values that are
/// already strings or scalars with an obvious string form.
fn extract_attributes(raw: &RawEvent) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(attrs) = raw.actor_attributes() {
        for (k, v) in attrs {
            match v {
                Value::String(s) => {
                    out.insert(k.clone(), s.clone());
                }
                Value::Number(n) => {
                    out.insert(k.clone(), n.to_string());
                }
                Value::Bool(b) => {
                    out.insert(k.clone(), b.to_string());
                }
                _ => {}
            }
        }
    }
    out
}

fn extract_actor_id(raw: &RawEvent, attributes: &HashMap<String, String>) -> Extracted<String> {
    if let Some(id) = raw.str_field(&["id", "ID"]) {
        if !id.is_empty() {
            return Extracted::found(id.to_string());
        }
    }
    if let Some(id) = raw
        .actor()
        .and_then(|a| ["ID", "id"].iter().find_map(|k| a.get(*k)))
        .and_then(Value::as_str)
    {
        if !id.is_empty() {
            return Extracted::found(id.to_string());
        }
    }
    if let Some(id) = attributes.get("container").or_else(|| attributes.get("id")) {
        if !id.is_empty() {
            return Extracted::found(id.clone());
        }
    }
    Extracted::defaulted(
        UNKNOWN.to_string(),
        Diagnostic::new("actor_id", "no id in event, actor, or attributes"),
    )
}

fn extract_actor_name(attributes: &HashMap<String, String>) -> String {
    attributes
        .get("name")
        .or_else(|| attributes.get("container"))
        .cloned()
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn extract_image(attributes: &HashMap<String, String>) -> Option<String> {
    attributes
        .get("image")
        .or_else(|| attributes.get("image.name"))
        .cloned()
}

/// Exit codes arrive as numbers or numeric strings depending on the runtime
/// version; anything else degrades to `None`.
fn extract_exit_code(
    raw: &RawEvent,
    attributes: &HashMap<String, String>,
) -> Extracted<Option<i64>> {
    for key in ["exitCode", "exit_code", "exit"] {
        if let Some(s) = attributes.get(key) {
            return match s.trim().parse::<i64>() {
                Ok(code) => Extracted::found(Some(code)),
                Err(_) => Extracted::defaulted(
                    None,
                    Diagnostic::new("exit_code", format!("non-numeric value `{s}`")),
                ),
            };
        }
        if let Some(v) = raw.field(&[key]) {
            if let Some(code) = v.as_i64() {
                return Extracted::found(Some(code));
            }
            if let Some(code) = v.as_str().and_then(|s| s.trim().parse::<i64>().ok()) {
                return Extracted::found(Some(code));
            }
            return Extracted::defaulted(
                None,
                Diagnostic::new("exit_code", format!("unexpected shape `{v}`")),
            );
        }
    }
    Extracted::defaulted(None, Diagnostic::new("exit_code", "absent on termination"))
}

/// Timestamp preference: `time` (seconds) → `timeNano` (nanoseconds) →
/// `timestamp`/`timeStamp` (seconds) → receipt time.
fn extract_timestamp(raw: &RawEvent, received_at: DateTime<Utc>) -> Extracted<DateTime<Utc>> {
    if let Some(ts) = raw
        .field(&["time"])
        .and_then(Value::as_i64)
        .filter(|t| *t > 0)
        .and_then(|t| DateTime::from_timestamp(t, 0))
    {
        return Extracted::found(ts);
    }
    if let Some(ts) = raw
        .field(&["timeNano"])
        .and_then(Value::as_i64)
        .filter(|t| *t > 0)
        .and_then(nanos_to_datetime)
    {
        return Extracted::found(ts);
    }
    if let Some(ts) = raw
        .field(&["timestamp", "timeStamp"])
        .and_then(Value::as_i64)
        .filter(|t| *t > 0)
        .and_then(|t| DateTime::from_timestamp(t, 0))
    {
        return Extracted::found(ts);
    }
    // Absent timestamps are common enough that only a *present but
    // unusable* field is worth a diagnostic.
    match raw.field(&["time", "timeNano", "timestamp", "timeStamp"]) {
        Some(v) => Extracted::defaulted(
            received_at,
            Diagnostic::new("timestamp", format!("unusable value `{v}`")),
        ),
        None => Extracted::found(received_at),
    }
}

fn nanos_to_datetime(nanos: i64) -> Option<DateTime<Utc>> {
    let secs = nanos.div_euclid(1_000_000_000);
    let subsec = nanos.rem_euclid(1_000_000_000) as u32;
    DateTime::from_timestamp(secs, subsec)
}
