//! Domain factories for creating identifiers.

use super::{ClientIdentity, QuestionId, Timestamp, error::ValueObjectError};

/// Factory for generating ClientIdentity instances.
pub struct ClientIdentityFactory;

impl ClientIdentityFactory {
    /// Generate a random session identity like `mcq_client_1a2b3c4d`.
    ///
    /// The token is random and never derived from user data.
    pub fn generate() -> Result<ClientIdentity, ValueObjectError> {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        ClientIdentity::new(format!("mcq_client_{}", &uuid[..8]))
    }
}

/// Factory for time-derived question ids (`q_<millis>`).
///
/// Ids are strictly increasing within one factory, so two questions created
/// in the same millisecond still get distinct ids.
#[derive(Debug, Default)]
pub struct QuestionIdFactory {
    last: Option<i64>,
}

impl QuestionIdFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next id for a question created at `now`.
    pub fn generate(&mut self, now: Timestamp) -> Result<QuestionId, ValueObjectError> {
        let millis = match self.last {
            Some(last) if now.value() <= last => last + 1,
            _ => now.value(),
        };
        self.last = Some(millis);
        QuestionId::new(format!("q_{millis}"))
    }
}
