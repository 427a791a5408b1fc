//! Terminal front-end: command parsing, rendering and the interactive loop.

pub mod command;
pub mod render;
mod runner;

pub use command::{CliCommand, CommandParseError, parse_line};
pub use runner::{ClientError, run};
