//! Terminal input source.
//!
//! Reads standard input line by line on a dedicated thread (blocking reads
//! must stay off the Tokio runtime) and forwards parsed events over a channel.
//!
//! # Line format
//!
//! - A line starting with `:` is a command (`:record`, `:stop`, `:play`,
//!   `:save`, `:load <path>`, `:status`, `:help`, `:quit`).
//! - Any other line is played: each non-whitespace character becomes one
//!   key-down, in order.  Characters that are not piano keys are ignored
//!   further downstream.
//!
//! End of input is reported as [`ControlAction::Quit`].

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

use super::{CaptureError, ControlAction, InputSource, RawInputEvent};

type SharedSender = Arc<Mutex<Option<UnboundedSender<RawInputEvent>>>>;

/// [`InputSource`] backed by the process's standard input.
pub struct ConsoleInputSource {
    sender: SharedSender,
}

impl ConsoleInputSource {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }
}

impl Default for ConsoleInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for ConsoleInputSource {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RawInputEvent>, CaptureError> {
        let mut guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *guard = Some(tx);
        drop(guard);

        let sender = Arc::clone(&self.sender);
        let spawned = std::thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || read_lines(std::io::stdin().lock(), &sender));
        if let Err(e) = spawned {
            if let Ok(mut guard) = self.sender.lock() {
                *guard = None;
            }
            return Err(CaptureError::ReaderSpawnFailed(e));
        }
        Ok(rx)
    }

    fn stop(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            *guard = None;
        }
    }
}

fn read_lines(input: impl BufRead, sender: &SharedSender) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("stdin read failed: {e}");
                break;
            }
        };
        if !forward(sender, parse_line(&line)) {
            return;
        }
    }
    debug!("stdin closed");
    forward(sender, vec![RawInputEvent::Control(ControlAction::Quit)]);
}

/// Sends `events`; returns `false` once the source was stopped.
fn forward(sender: &SharedSender, events: Vec<RawInputEvent>) -> bool {
    let Ok(guard) = sender.lock() else {
        return false;
    };
    let Some(tx) = guard.as_ref() else {
        return false;
    };
    events.into_iter().all(|event| tx.send(event).is_ok())
}

/// Parses one line of terminal input into events.
pub fn parse_line(line: &str) -> Vec<RawInputEvent> {
    let line = line.trim();
    match line.strip_prefix(':') {
        Some(command) => vec![RawInputEvent::Control(parse_command(command))],
        None => line
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(RawInputEvent::key_down)
            .collect(),
    }
}

fn parse_command(command: &str) -> ControlAction {
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name.to_ascii_lowercase().as_str() {
        "record" | "rec" => ControlAction::Record,
        "stop" => ControlAction::Stop,
        "play" => ControlAction::Play,
        "save" => ControlAction::Save,
        "load" if !arg.is_empty() => ControlAction::Load(PathBuf::from(arg)),
        "status" => ControlAction::Status,
        "quit" | "q" | "exit" => ControlAction::Quit,
        _ => ControlAction::Help,
    }
}
