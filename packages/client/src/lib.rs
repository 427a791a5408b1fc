//! Quizcast client library.
//!
//! A live classroom quiz client: a broadcaster publishes multiple-choice
//! questions, participants answer and chat, and every client keeps its own
//! eventually consistent view of the session over an at-least-once
//! pub/sub broker.
//!
//! ```no_run
//! use quizcast_client::{infrastructure::WsLink, session::{Session, SessionConfig}};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let (handle, mut events) = Session::spawn(
//!     SessionConfig::participant().with_username("alice"),
//!     WsLink::new("ws://127.0.0.1:3000/ws"),
//! )?;
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod infrastructure;
pub mod session;
pub mod ui;
pub mod usecase;

pub use session::{Session, SessionConfig, SessionEvent, SessionHandle};
