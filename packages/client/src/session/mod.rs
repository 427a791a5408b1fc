//! Session: one running quiz client.
//!
//! [`Session::spawn`] starts a runner task and returns a [`SessionHandle`]
//! for commands plus a receiver of [`SessionEvent`] notifications.

pub mod config;
pub mod event;
pub mod handle;
pub mod reconnect;
pub mod runner;
pub mod sync;

pub use config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEEPALIVE, DEFAULT_RECONNECT_BACKOFF, DEFAULT_USERNAME,
    SessionConfig,
};
pub use event::{SessionEvent, SessionSnapshot, SyncState};
pub use handle::{SessionError, SessionHandle};
pub use reconnect::ReconnectPolicy;
pub use runner::Session;
pub use sync::SyncCore;
