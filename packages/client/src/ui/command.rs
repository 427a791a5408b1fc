//! Line command parser for the interactive client.
//!
//! | Input | Command |
//! |-------|---------|
//! | `/ask <question> \| <opt> \| <opt> ... \| <correct,indices>` | broadcast a question |
//! | `/answer <questionId> <indices> [mcq\|chat]` | submit an answer |
//! | `/list` | show the question history |
//! | `/status` | show connection and tally information |
//! | `/quit` | leave |
//! | anything else | chat message |
//!
//! Option indices are zero-based, as on the wire.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::domain::{QuestionDraft, QuestionId, RoleTag, ValueObjectError};

pub const ASK_USAGE: &str = "/ask <question> | <option> | <option> ... | <correct indices>";
pub const ANSWER_USAGE: &str = "/answer <questionId> <indices> [mcq|chat]";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Ask(QuestionDraft),
    Answer {
        question_id: QuestionId,
        selected: BTreeSet<usize>,
        role: RoleTag,
    },
    List,
    Status,
    Quit,
    Chat(String),
    /// Blank line
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command '{0}' (try /ask, /answer, /list, /status or /quit)")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a valid option index")]
    InvalidIndex(String),

    #[error(transparent)]
    InvalidValue(#[from] ValueObjectError),
}

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<CliCommand, CommandParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(CliCommand::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(CliCommand::Chat(line.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    match name {
        "ask" => parse_ask(args),
        "answer" => parse_answer(args),
        "list" => Ok(CliCommand::List),
        "status" => Ok(CliCommand::Status),
        "quit" | "exit" => Ok(CliCommand::Quit),
        other => Err(CommandParseError::UnknownCommand(format!("/{other}"))),
    }
}

fn parse_ask(args: &str) -> Result<CliCommand, CommandParseError> {
    let mut parts: Vec<&str> = args.split('|').map(str::trim).collect();
    // question, two options and the correct indices at minimum
    if parts.len() < 4 {
        return Err(CommandParseError::Usage(ASK_USAGE));
    }
    let correct = parse_indices(parts.pop().unwrap_or_default())?;
    let text = parts.remove(0);
    let options = parts.into_iter().map(str::to_string).collect();
    Ok(CliCommand::Ask(QuestionDraft::new(text, options, correct)))
}

fn parse_answer(args: &str) -> Result<CliCommand, CommandParseError> {
    let mut words = args.split_whitespace();
    let (Some(id), Some(indices)) = (words.next(), words.next()) else {
        return Err(CommandParseError::Usage(ANSWER_USAGE));
    };
    let role = match words.next() {
        Some(tag) => tag.parse::<RoleTag>()?,
        None => RoleTag::Mcq,
    };
    if words.next().is_some() {
        return Err(CommandParseError::Usage(ANSWER_USAGE));
    }
    Ok(CliCommand::Answer {
        question_id: QuestionId::new(id.to_string())?,
        selected: parse_indices(indices)?,
        role,
    })
}

fn parse_indices(input: &str) -> Result<BTreeSet<usize>, CommandParseError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| CommandParseError::InvalidIndex(s.to_string()))
        })
        .collect()
}
