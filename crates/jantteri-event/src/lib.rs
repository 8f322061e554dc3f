//! Event types published by Jantteri sessions.
//!
//! Every session owns a publication room. Two kinds of message flow through
//! it:
//!
//! | Topic | Payload | Produced by |
//! |-------|---------|-------------|
//! | `console_output` | [`ConsoleMessage`] | `print(...)`, diagnostics |
//! | `jantteri_event` | [`StructuredEvent`] | `send_activate_event(...)` |
//!
//! Payloads are converted to a keyed JSON structure before they reach the
//! publisher, so transports never see Rust types.
//!
//! # Example
//!
//! ```
//! use jantteri_event::{Publication, StructuredEvent, Topic};
//!
//! let event = StructuredEvent::activate_request(7, 2.5).unwrap();
//! let publication = Publication::event(&event).unwrap();
//!
//! assert_eq!(publication.topic, Topic::DeviceEvent);
//! assert_eq!(publication.payload["device_id"], 7);
//! assert_eq!(publication.payload["event_kind"], "ACTIVATE_REQUEST");
//! ```

mod console;
mod error;
mod event;
mod publication;

pub use console::ConsoleMessage;
pub use error::EventError;
pub use event::{EventKind, StructuredEvent};
pub use publication::{Publication, Topic};

/// Current time as whole seconds since the Unix epoch.
#[must_use]
pub fn unix_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Current time as fractional seconds since the Unix epoch.
#[must_use]
pub fn unix_seconds_f64() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
