//! Value objects for the relay broker.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

/// Maximum topic length in characters
pub const MAX_TOPIC_LENGTH: usize = 256;

/// Identifier of one WebSocket connection (UUID v4)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a ConnectionId from a UUID string.
    ///
    /// # Errors
    ///
    /// * `ValueObjectError::ConnectionIdEmpty` - empty string
    /// * `ValueObjectError::ConnectionIdInvalidFormat` - not a UUID
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::ConnectionIdEmpty);
        }
        if uuid::Uuid::parse_str(&id).is_err() {
            return Err(ValueObjectError::ConnectionIdInvalidFormat(id));
        }
        Ok(Self(id))
    }

    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An exact topic name such as `mcq/classroom/chat`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic(String);

impl Topic {
    /// Create a Topic.
    ///
    /// Only exact names are accepted: MQTT wildcards (`+`, `#`) are rejected.
    pub fn new(topic: String) -> Result<Self, ValueObjectError> {
        if topic.is_empty() {
            return Err(ValueObjectError::TopicEmpty);
        }
        let len = topic.chars().count();
        if len > MAX_TOPIC_LENGTH {
            return Err(ValueObjectError::TopicTooLong {
                max: MAX_TOPIC_LENGTH,
                actual: len,
            });
        }
        if topic.contains(['+', '#']) {
            return Err(ValueObjectError::TopicWildcard(topic));
        }
        Ok(Self(topic))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Topic {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn now() -> Self {
        Self(quizcast_shared::time::now_millis())
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
