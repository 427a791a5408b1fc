//! Plain-text rendering of session state for the terminal

use std::fmt::Write;

use quizcast_shared::time::millis_to_rfc3339;

use crate::{
    domain::{ChatMessage, Question, QuestionId},
    session::{SessionEvent, SessionSnapshot},
};

pub fn render_question(question: &Question, is_current: bool) -> String {
    let marker = if is_current { "*" } else { " " };
    let mut out = format!("{marker} [{}] {}", question.id(), question.text());
    for (index, option) in question.options().iter().enumerate() {
        let _ = write!(out, "\n      {index}) {option}");
    }
    out
}

pub fn render_history(history: &[Question], current: Option<&QuestionId>) -> String {
    if history.is_empty() {
        return "No questions yet".to_string();
    }
    history
        .iter()
        .map(|q| render_question(q, Some(q.id()) == current))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_chat(message: &ChatMessage) -> String {
    let time = millis_to_rfc3339(message.timestamp.value()).unwrap_or_default();
    format!("[{time}] {}: {}", message.username, message.text)
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let mut out = format!(
        "{} as {:?} ({}, {:?})",
        snapshot.identity, snapshot.role, snapshot.connection, snapshot.sync
    );
    match &snapshot.current {
        Some(question) => {
            let tally = snapshot.tally(question.id());
            let _ = write!(
                out,
                "\nCurrent question {}: {} answers, {} correct",
                question.id(),
                tally.total,
                tally.correct
            );
        }
        None => out.push_str("\nNo active question"),
    }
    let _ = write!(
        out,
        "\n{} questions, {} submissions, {} chat messages",
        snapshot.history.len(),
        snapshot.submissions.len(),
        snapshot.chat.len()
    );
    out
}

/// Text for an event, or `None` for events not worth printing.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::HistoryChanged { history, current } => {
            let question = current
                .as_ref()
                .and_then(|id| history.iter().find(|q| q.id() == id))?;
            Some(render_question(question, true))
        }
        SessionEvent::ChatAppended(message) => Some(render_chat(message)),
        SessionEvent::ConnectionStateChanged(state) => Some(format!("-- {state} --")),
        SessionEvent::SubmissionResult {
            question_id,
            role,
            accepted: true,
            is_correct,
        } => {
            let verdict = match is_correct {
                Some(true) => "correct",
                Some(false) => "incorrect",
                None => "submitted",
            };
            Some(format!("Answer to {question_id} ({role}): {verdict}"))
        }
        SessionEvent::SubmissionResult { .. } => None,
        SessionEvent::AnswerReceived { answer, tally } => Some(format!(
            "{} answered {} ({}): {}/{} correct so far",
            answer.user_id, answer.question_id, answer.role, tally.correct, tally.total
        )),
        SessionEvent::PublishFailed { kind, reason } => {
            Some(format!("Could not send {kind}: {reason}"))
        }
    }
}
