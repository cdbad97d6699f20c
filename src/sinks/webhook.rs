//! # WebhookSink — embed-style webhook alert sink
//!
//! Formats one canonical event as an embed payload (title with an action
//! emoji, color keyed to severity, aligned field table in the description)
//! and POSTs it to the configured webhook URL with a bounded timeout.
//!
//! Delivery semantics: 200/204 is success, anything else is a
//! [`SinkError::Status`]. The sink worker logs failures; they never stop
//! event consumption.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::SinkError;
use crate::events::{Action, CanonicalEvent, EventKind};

use super::sink::AlertSink;

/// Alert sink posting embed payloads to a webhook endpoint.
pub struct WebhookSink {
    url: String,
    client: Client,
}

impl WebhookSink {
    /// Creates a sink for the given webhook URL with a per-request timeout.
    pub fn new(url: String, timeout: Duration) -> Result<Self, SinkError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }

    /// Builds the embed payload for one event.
    fn payload(&self, event: &CanonicalEvent) -> Value {
        let mut lines = vec![
            format!("Kind        : {}", event.kind.as_label()),
            format!("Action      : {}", event.action),
            format!("Severity    : {}", event.severity),
        ];
        if event.kind == EventKind::Container {
            lines.push(format!("Name        : {}", event.actor_name));
            if let Some(image) = &event.image {
                lines.push(format!("Image       : {image}"));
            }
            lines.push(format!("ID          : {}", event.short_id()));
            if let Some(code) = event.exit_code {
                lines.push(format!("Exit Code   : {code}"));
            }
        } else {
            lines.push(format!("ID          : {}", event.short_id()));
        }
        let description = format!("```\n{}\n```", lines.join("\n"));

        json!({
            "embeds": [{
                "title": format!(
                    "{} {} Container Event: {}",
                    event.severity.emoji(),
                    action_emoji(&event.action),
                    event.action
                ),
                "color": event.severity.color(),
                "description": description,
                "timestamp": event.timestamp.to_rfc3339(),
            }]
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn deliver(&self, event: &CanonicalEvent) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(event))
            .send()
            .await?;
        match response.status().as_u16() {
            200 | 204 => Ok(()),
            status => Err(SinkError::Status { status }),
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Emoji decoration per action, for scannable alert titles.
fn action_emoji(action: &Action) -> &'static str {
    match action {
        Action::Die => "\u{1faa6}",
        Action::Kill => "\u{1f480}",
        Action::Oom => "\u{1f4a5}",
        Action::Restart => "\u{27f2}",
        Action::Start => "\u{25b6}\u{fe0f}",
        Action::Stop => "\u{23f9}\u{fe0f}",
        Action::Create => "\u{1f3d7}\u{fe0f}",
        Action::Destroy => "\u{1f5d1}\u{fe0f}",
        Action::Pause => "\u{23f8}\u{fe0f}",
        Action::Unpause => "\u{25b6}\u{fe0f}",
        Action::Pull => "\u{2b07}\u{fe0f}",
        Action::Push => "\u{2b06}\u{fe0f}",
        Action::Connect => "\u{1f517}",
        Action::Disconnect => "\u{26d3}\u{fe0f}",
        Action::Attach => "\u{1f50c}",
        Action::HealthStatus(result) => {
            if matches!(result, crate::events::HealthResult::Healthy) {
                "\u{2764}\u{fe0f}"
            } else {
                "\u{1f494}"
            }
        }
        Action::Other(_) => "",
    }
}
