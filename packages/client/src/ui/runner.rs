//! Interactive client loop.

use rustyline::{DefaultEditor, error::ReadlineError};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    domain::{Role, ValueObjectError},
    infrastructure::WsLink,
    session::{Session, SessionConfig, SessionError, SessionHandle},
};

use super::{
    command::{CliCommand, parse_line},
    render::{render_event, render_history, render_status},
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to create client identity: {0}")]
    Identity(#[from] ValueObjectError),

    #[error("failed to start line editor: {0}")]
    Editor(#[from] ReadlineError),
}

/// Run the interactive client until `/quit`, end of input or Ctrl-C.
pub async fn run(url: String, config: SessionConfig) -> Result<(), ClientError> {
    let editor = DefaultEditor::new()?;
    let prompt = match config.role {
        Role::Broadcaster => "quizcast(broadcaster)> ",
        Role::Participant => "quizcast> ",
    };

    tracing::info!("Connecting to {}", url);
    let link = WsLink::new(url).with_keepalive(config.keepalive);
    let (handle, mut events) = Session::spawn(config, link)?;

    // rustyline blocks, so it gets its own thread; the process exit ends it.
    let (line_tx, mut lines) = mpsc::unbounded_channel();
    std::thread::spawn(move || read_lines(editor, prompt, line_tx));

    println!("Type /ask, /answer, /list, /status or /quit. Anything else is sent as chat.");
    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                match handle_line(&handle, &line).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        tracing::error!("Session ended unexpectedly: {}", e);
                        break;
                    }
                }
            }
            event = events.recv() => match event {
                Some(event) => {
                    if let Some(text) = render_event(&event) {
                        println!("{text}");
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Err(e) = handle.shutdown().await {
        tracing::warn!("Shutdown failed: {}", e);
    }
    println!("Bye");
    Ok(())
}

fn read_lines(mut editor: DefaultEditor, prompt: &str, lines: mpsc::UnboundedSender<String>) {
    loop {
        match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                if lines.send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        }
    }
}

/// Execute one input line. Returns `Ok(false)` when the user asked to quit.
async fn handle_line(handle: &SessionHandle, line: &str) -> Result<bool, SessionError> {
    let command = match parse_line(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{e}");
            return Ok(true);
        }
    };

    let result = match command {
        CliCommand::Empty => Ok(()),
        CliCommand::Quit => return Ok(false),
        CliCommand::Chat(text) => handle.submit_chat(text).await.map(|_| ()),
        CliCommand::Ask(draft) => handle
            .submit_broadcast(draft.text, draft.options, draft.correct_answers)
            .await
            .map(|_| ()),
        CliCommand::Answer {
            question_id,
            selected,
            role,
        } => handle
            .submit_answer(question_id, role, selected)
            .await
            .map(|outcome| {
                if let Some(e) = outcome.publish_error {
                    println!("Answer recorded but not sent: {e}");
                }
            }),
        CliCommand::List => handle.snapshot().await.map(|snapshot| {
            let current = snapshot.current.as_ref().map(|q| q.id());
            println!("{}", render_history(&snapshot.history, current));
        }),
        CliCommand::Status => handle
            .snapshot()
            .await
            .map(|snapshot| println!("{}", render_status(&snapshot))),
    };

    match result {
        Ok(()) => Ok(true),
        Err(SessionError::Closed) => Err(SessionError::Closed),
        Err(e) => {
            println!("{e}");
            Ok(true)
        }
    }
}
