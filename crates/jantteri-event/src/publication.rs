//! Messages delivered to session subscribers.

use crate::{ConsoleMessage, EventError, StructuredEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic of a [`Publication`] within a session room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Script output and engine diagnostics.
    #[serde(rename = "console_output")]
    ConsoleOutput,
    /// Structured device events.
    #[serde(rename = "jantteri_event")]
    DeviceEvent,
}

impl Topic {
    /// Wire name of the topic.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConsoleOutput => "console_output",
            Self::DeviceEvent => "jantteri_event",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic plus its keyed payload, as handed to the publisher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    pub topic: Topic,
    pub payload: serde_json::Value,
}

impl Publication {
    #[must_use]
    pub fn console(message: &ConsoleMessage) -> Self {
        Self {
            topic: Topic::ConsoleOutput,
            payload: message.to_payload(),
        }
    }

    /// # Errors
    ///
    /// Returns [`EventError::Serialize`] if the event cannot be converted.
    pub fn event(event: &StructuredEvent) -> Result<Self, EventError> {
        Ok(Self {
            topic: Topic::DeviceEvent,
            payload: event.to_payload()?,
        })
    }

    /// Returns the console text if this is a console publication.
    #[must_use]
    pub fn console_text(&self) -> Option<&str> {
        match self.topic {
            Topic::ConsoleOutput => self.payload.get("message").and_then(|m| m.as_str()),
            Topic::DeviceEvent => None,
        }
    }
}
