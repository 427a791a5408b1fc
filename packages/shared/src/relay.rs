//! Relay frames exchanged between a client link and the broker.
//!
//! Every WebSocket text message carries exactly one JSON frame tagged by
//! `type`:
//!
//! ```text
//! client -> broker   {"type":"subscribe","topic":"mcq/classroom/questions"}
//! client -> broker   {"type":"unsubscribe","topic":"mcq/classroom/questions"}
//! client -> broker   {"type":"publish","topic":"...","payload":"...","qos":1}
//! broker -> client   {"type":"message","topic":"...","payload":"..."}
//! ```
//!
//! Payloads are opaque UTF-8 text to the broker.

use serde::{Deserialize, Serialize};

/// Default QoS level carried by publish frames (at-least-once)
pub const DEFAULT_QOS: u8 = 1;

/// A single relay frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelayFrame {
    /// Start receiving messages published on `topic`
    Subscribe { topic: String },
    /// Stop receiving messages published on `topic`
    Unsubscribe { topic: String },
    /// Publish `payload` to every subscriber of `topic`
    Publish {
        topic: String,
        payload: String,
        #[serde(default = "default_qos")]
        qos: u8,
    },
    /// Delivery of a published payload to a subscriber
    Message { topic: String, payload: String },
}

fn default_qos() -> u8 {
    DEFAULT_QOS
}

impl RelayFrame {
    /// Serialize the frame to its JSON text form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a frame from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
