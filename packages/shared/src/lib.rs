//! Shared utilities for Quizcast.
//!
//! Used by both the broker (`quizcast-broker`) and the client
//! (`quizcast-client`): logger setup, timestamp helpers and the relay
//! frames spoken over the broker WebSocket.

pub mod logger;
pub mod relay;
pub mod time;
