//! Raw events exactly as delivered by the runtime.
//!
//! A [`RawEvent`] is a thin wrapper around the decoded JSON value of one
//! frame. Nothing about its shape is guaranteed: keys may be missing, types
//! may be wrong, and nesting varies between runtime versions. The accessors
//! here only *probe* (they return `Option` and never panic), so the
//! normalizer can treat every field as potentially absent.

use serde_json::{Map, Value};

use crate::error::StreamError;

/// One untyped event record from the runtime's stream.
#[derive(Debug, Clone)]
pub struct RawEvent(Value);

impl RawEvent {
    /// Decodes a single newline-delimited frame.
    ///
    /// Any JSON value is accepted; shape validation is the normalizer's
    /// concern. A frame that is not valid JSON at all yields
    /// [`StreamError::Frame`], and the connector skips it.
    pub fn from_line(line: &str) -> Result<Self, StreamError> {
        serde_json::from_str::<Value>(line)
            .map(RawEvent)
            .map_err(StreamError::Frame)
    }

    /// Wraps an already-decoded JSON value.
    pub fn from_value(value: Value) -> Self {
        RawEvent(value)
    }

    /// Borrows the underlying JSON value.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Looks up a top-level field by the first key that is present.
    pub fn field(&self, keys: &[&str]) -> Option<&Value> {
        let obj = self.0.as_object()?;
        keys.iter().find_map(|k| obj.get(*k))
    }

    /// Looks up a top-level string field by the first key that is present
    /// *and* holds a string.
    pub fn str_field(&self, keys: &[&str]) -> Option<&str> {
        let obj = self.0.as_object()?;
        keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
    }

    /// Returns the actor object (`Actor` or `actor`), if any.
    pub fn actor(&self) -> Option<&Map<String, Value>> {
        self.field(&["Actor", "actor"]).and_then(Value::as_object)
    }

    /// Returns the actor attribute map (`Actor.Attributes` or lowercase
    /// variants), if present and actually a map.
    pub fn actor_attributes(&self) -> Option<&Map<String, Value>> {
        let actor = self.actor()?;
        ["Attributes", "attributes"]
            .iter()
            .find_map(|k| actor.get(*k).and_then(Value::as_object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_line_accepts_any_json_shape() {
        assert!(RawEvent::from_line("{\"Type\":\"container\"}").is_ok());
        assert!(RawEvent::from_line("42").is_ok());
        assert!(RawEvent::from_line("[1,2]").is_ok());
    }

    #[test]
    fn from_line_rejects_non_json() {
        let err = RawEvent::from_line("{truncated").unwrap_err();
        assert_eq!(err.as_label(), "stream_frame");
    }

    #[test]
    fn field_probing_prefers_first_present_key() {
        let ev = RawEvent::from_value(json!({"type": "image", "Type": "container"}));
        assert_eq!(ev.str_field(&["Type", "type"]), Some("container"));
        assert_eq!(ev.str_field(&["missing", "type"]), Some("image"));
        assert_eq!(ev.str_field(&["missing"]), None);
    }

    #[test]
    fn probing_a_non_object_yields_none() {
        let ev = RawEvent::from_value(json!("just a string"));
        assert_eq!(ev.str_field(&["Type"]), None);
        assert!(ev.actor().is_none());
    }

    #[test]
    fn actor_attributes_tolerate_wrong_types() {
        let ev = RawEvent::from_value(json!({"Actor": {"Attributes": "not-a-map"}}));
        assert!(ev.actor().is_some());
        assert!(ev.actor_attributes().is_none());
    }
}
