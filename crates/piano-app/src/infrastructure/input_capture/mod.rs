//! Input capture infrastructure for the virtual piano.
//!
//! Every front-end turns what the user does into a stream of
//! [`RawInputEvent`]s: key-downs carrying the typed character, pointer clicks
//! on a rendered key, and transport controls.  The session only ever sees
//! this stream, so the console front-end and the tests drive the piano through
//! exactly the same path.
//!
//! # Testability
//!
//! The [`InputSource`] trait allows unit tests to inject synthetic events
//! through [`mock::MockInputSource`] without a terminal.

use std::path::PathBuf;

use piano_core::KeyCategory;
use tokio::sync::mpsc;

pub mod console;
pub mod mock;

/// A raw input event produced by an input source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInputEvent {
    /// A key was pressed down.
    KeyDown {
        /// The key's character payload as reported by the front-end (`"a"`,
        /// `"A"`, `"["`, `"Shift"`).
        key: String,
        /// `true` for an auto-repeat key-down.
        repeat: bool,
    },
    /// A rendered key was clicked.
    PointerClick {
        category: KeyCategory,
        /// Position of the key within its row, left to right.
        index: usize,
    },
    /// A transport or application control was activated.
    Control(ControlAction),
}

impl RawInputEvent {
    /// A non-repeat key-down for `c`.
    pub fn key_down(c: char) -> Self {
        Self::KeyDown {
            key: c.to_string(),
            repeat: false,
        }
    }
}

/// Control identifiers carried by [`RawInputEvent::Control`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    Record,
    Stop,
    Play,
    Save,
    Load(PathBuf),
    Status,
    Help,
    Quit,
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("input source has already been started")]
    AlreadyStarted,
    #[error("failed to spawn input reader: {0}")]
    ReaderSpawnFailed(#[source] std::io::Error),
}

/// Trait abstracting input event production.
///
/// The production implementation reads the terminal; tests use
/// [`mock::MockInputSource`].
pub trait InputSource: Send {
    /// Starts the input source and returns a receiver for captured events.
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RawInputEvent>, CaptureError>;
    /// Stops the input source.  The receiver sees the channel close.
    fn stop(&self);
}
