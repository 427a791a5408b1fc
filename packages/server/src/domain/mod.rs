//! Domain layer for the relay broker.
//!
//! Connections, exact-match topic subscriptions and the repository
//! abstraction the use cases depend on.

pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{BrokerStats, Connection, SubscriptionTable};
pub use error::{RepositoryError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use repository::SubscriptionRepository;
pub use value_object::{ConnectionId, MAX_TOPIC_LENGTH, Timestamp, Topic};
