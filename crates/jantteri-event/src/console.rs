//! Console text messages.

use jantteri_types::SessionId;
use serde::Serialize;

/// One line of script output, or an engine diagnostic, for a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleMessage {
    pub message: String,
    pub session_id: SessionId,
    /// Fractional seconds since the Unix epoch.
    pub timestamp: f64,
}

impl ConsoleMessage {
    /// Creates a message stamped with the current time.
    #[must_use]
    pub fn now(session_id: SessionId, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id,
            timestamp: crate::unix_seconds_f64(),
        }
    }

    /// Keyed, transport-neutral form.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "session_id": self.session_id,
            "timestamp": self.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shape() {
        let id: SessionId = "ABCDEF".parse().unwrap();
        let msg = ConsoleMessage::now(id, "hello");
        let payload = msg.to_payload();

        assert_eq!(payload["message"], "hello");
        assert_eq!(payload["session_id"], "ABCDEF");
        assert!(payload["timestamp"].as_f64().unwrap() > 1_600_000_000.0);
    }
}
