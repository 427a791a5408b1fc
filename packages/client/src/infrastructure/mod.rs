//! Infrastructure layer: wire codec and broker transport.

pub mod codec;
pub mod dto;
pub mod transport;

pub use codec::{CodecError, EncodedMessage, MessageCodec};
pub use transport::{
    BrokerLink, ConnectionState, InboundFrame, MemoryBroker, MemoryLink, QoS, TransportAdapter,
    TransportError, TransportEvent, WsLink,
};
