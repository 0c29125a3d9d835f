//! # Console
//!
//! An interactive line-oriented front end to a store.
//!
//! Each line holds one command, as understood by [`Command::parse`]. Words are separated
//! by whitespace; a double-quoted word may contain spaces, and `\"` inside it is a quote.
//!
//! Besides the store commands, the console understands:
//! - `MULTI` starts queueing commands, `EXEC` runs the queue as a [batch](crate::batch),
//!   `DISCARD` drops it,
//! - `HELP` lists the commands,
//! - `QUIT` or `EXIT` ends the session, as does the end of input.
//!
//! A failing command prints its error and the session goes on.

use crate::batch::Multi;
use crate::cmd::{Command, Reply};
use crate::constants::{COMMANDS, PROMPT};
use crate::errors::{ApplicationError, CmdError};
use crate::storage::Storage;
use log::{debug, trace};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// What the console does after handling a line
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Print this and read the next line
    Print(String),
    /// Read the next line
    Continue,
    Quit,
}

/// Per-session console state
#[derive(Debug, Default)]
pub struct Session {
    /// Commands queued since `MULTI`, if a batch is open
    queued: Option<Vec<Command>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `MULTI` batch is open
    pub fn in_multi(&self) -> bool {
        self.queued.is_some()
    }

    /// Handles one input line. Errors are turned into printable text.
    pub fn handle_line<S: Storage + ?Sized>(&mut self, store: &S, line: &str) -> Outcome {
        match self.try_handle_line(store, line) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!("{line:?} failed: {err}");
                Outcome::Print(format!("(error) {err}"))
            }
        }
    }

    fn try_handle_line<S: Storage + ?Sized>(
        &mut self,
        store: &S,
        line: &str,
    ) -> Result<Outcome, CmdError> {
        let words = tokenize(line)?;
        let Some(first) = words.first() else {
            return Ok(Outcome::Continue);
        };

        match first.to_ascii_uppercase().as_str() {
            "QUIT" | "EXIT" => Ok(Outcome::Quit),
            "HELP" => Ok(Outcome::Print(help())),
            "MULTI" => {
                if self.queued.is_some() {
                    return Err(CmdError::NestedMulti);
                }
                self.queued = Some(Vec::new());
                Ok(Outcome::Print(Reply::Ok.to_string()))
            }
            "DISCARD" => match self.queued.take() {
                Some(_) => Ok(Outcome::Print(Reply::Ok.to_string())),
                None => Err(CmdError::DiscardWithoutMulti),
            },
            "EXEC" => {
                let queued = self.queued.take().ok_or(CmdError::ExecWithoutMulti)?;
                let replies = queued
                    .into_iter()
                    .fold(Multi::new(store), Multi::push)
                    .exec()?;
                Ok(Outcome::Print(format_replies(&replies)))
            }
            _ => {
                let cmd = Command::parse(&words)?;
                match self.queued.as_mut() {
                    Some(queue) => {
                        trace!("Queued {}", cmd.name());
                        queue.push(cmd);
                        Ok(Outcome::Print("QUEUED".to_string()))
                    }
                    None => Ok(Outcome::Print(cmd.apply(store)?.to_string())),
                }
            }
        }
    }
}

/// Reads lines from `reader` until it's exhausted or the session quits, writing replies
/// and prompts to `writer`.
pub async fn run<S, R, W>(store: &S, reader: R, mut writer: W) -> Result<(), ApplicationError>
where
    S: Storage + ?Sized,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = Session::new();
    let mut lines = reader.lines();

    loop {
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match session.handle_line(store, &line) {
            Outcome::Print(text) => {
                writer.write_all(text.as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
            Outcome::Continue => {}
            Outcome::Quit => break,
        }
    }

    writer.flush().await?;
    Ok(())
}

/// Splits a line into words, keeping double-quoted words whole.
pub fn tokenize(line: &str) -> Result<Vec<String>, CmdError> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(c) = chars.next() else {
            break;
        };

        let mut word = String::new();
        if c == '"' {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' if chars.peek() == Some(&'"') => {
                        word.push('"');
                        chars.next();
                    }
                    _ => word.push(c),
                }
            }
            if !closed {
                return Err(CmdError::Syntax("unbalanced quotes".to_string()));
            }
        } else {
            word.push(c);
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(c);
            }
        }
        words.push(word);
    }

    Ok(words)
}

fn format_replies(replies: &[Reply]) -> String {
    if replies.is_empty() {
        return "(empty)".to_string();
    }
    replies
        .iter()
        .enumerate()
        .map(|(i, reply)| format!("{}) {reply}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn help() -> String {
    format!(
        "Commands: {}\nBatches: MULTI, EXEC, DISCARD\nSession: HELP, QUIT",
        COMMANDS.join(" ")
    )
}
