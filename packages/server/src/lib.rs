//! Quizcast relay broker.
//!
//! A small topic relay over WebSocket: clients subscribe to exact topic
//! names and every publish is delivered to all subscribers of that topic,
//! the publisher included.

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub use ui::{run, serve};
