//! Data transfer objects.
//!
//! WebSocket relay frames are shared with the client and live in
//! `quizcast_shared::relay`.

pub mod http;
