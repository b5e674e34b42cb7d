//! Note events and the recording that holds them.
//!
//! A [`Recording`] is an insertion-ordered list of [`NoteEvent`]s.  Events are
//! appended in the order keys were pressed, so offsets captured live are
//! non-decreasing.  The list is never sorted: a recording loaded from a file is
//! kept exactly as written and the scheduler orders playback by deadline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::keymap::KeyId;

/// One recorded key press.
///
/// Serialized as `{"key": "a", "time": 120}`; `time` is the on-disk name of
/// [`offset_ms`](Self::offset_ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Which key was pressed.
    pub key: KeyId,
    /// Milliseconds elapsed since recording start when the key was pressed.
    #[serde(rename = "time")]
    pub offset_ms: u64,
}

impl NoteEvent {
    pub fn new(key: KeyId, offset_ms: u64) -> Self {
        Self { key, offset_ms }
    }

    /// The offset as a [`Duration`], i.e. the playback delay for this event.
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms)
    }
}

/// The recorder's current mode.  Exactly one is active per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// Neither recording nor playing.
    #[default]
    Idle,
    /// Key presses are being captured into the recording.
    Armed,
    /// The recording is being replayed.
    Playing,
}

/// An ordered sequence of note events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recording {
    events: Vec<NoteEvent>,
}

impl Recording {
    /// Creates an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event at the end of the recording.
    pub fn push(&mut self, event: NoteEvent) {
        self.events.push(event);
    }

    /// Removes every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Returns the events in insertion order.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Largest offset in the recording, or `None` when empty.
    ///
    /// This is the maximum, not the last element: a loaded file need not be
    /// sorted.
    pub fn last_offset_ms(&self) -> Option<u64> {
        self.events.iter().map(|e| e.offset_ms).max()
    }

    /// Returns `true` when offsets never decrease in insertion order.
    pub fn is_chronological(&self) -> bool {
        self.events.windows(2).all(|w| w[0].offset_ms <= w[1].offset_ms)
    }
}

impl From<Vec<NoteEvent>> for Recording {
    fn from(events: Vec<NoteEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<NoteEvent> for Recording {
    fn from_iter<I: IntoIterator<Item = NoteEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Recording {
    type Item = NoteEvent;
    type IntoIter = std::vec::IntoIter<NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a Recording {
    type Item = &'a NoteEvent;
    type IntoIter = std::slice::Iter<'a, NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
