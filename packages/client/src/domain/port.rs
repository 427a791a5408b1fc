//! Outbound port used by the use cases.
//!
//! The domain defines the trait; the transport adapter implements it.

use async_trait::async_trait;

use crate::infrastructure::transport::TransportError;

/// Publishes an encoded payload on a topic (QoS 1).
///
/// Success only means the local send attempt went through; there is no
/// delivery confirmation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send {
    async fn publish(&mut self, topic: String, payload: Vec<u8>) -> Result<(), TransportError>;
}
