//! WebSocket relay server implementation.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{DEFAULT_HOST, DEFAULT_PORT, ServerError, build_router, run, serve};
