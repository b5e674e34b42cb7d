//! Domain entities for the virtual piano.
//!
//! Pure data with no I/O: the note events captured while recording, the
//! ordered recording that holds them, and the recorder's state enum.

pub mod recording;

pub use recording::{NoteEvent, Recording, RecordingState};
