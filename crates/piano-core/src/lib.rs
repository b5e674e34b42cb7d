//! # piano-core
//!
//! Shared library for the virtual piano containing the playable key table,
//! the note-event data model, and the JSON codec for recording files.
//!
//! It has zero dependencies on audio devices, UI frameworks, or async runtimes,
//! so every piece here can be unit-tested synchronously.
//!
//! # Architecture overview (for beginners)
//!
//! The piano has 26 playable keys: 15 white keys bound to the home and bottom
//! letter rows (`a s d … n`) and 11 black keys bound to the top row
//! (`q w e … p [`).  Pressing a key plays its sample; while the recorder is
//! armed, each press is also written down together with the number of
//! milliseconds since recording started.
//!
//! - **`keymap`** – The fixed key table: which characters are playable, which
//!   category (white/black) each belongs to, and the sample each one plays.
//!
//! - **`domain`** – The recording itself: [`NoteEvent`], [`Recording`] and the
//!   [`RecordingState`] the recorder can be in.
//!
//! - **`codec`** – How a recording travels to and from disk: a JSON array of
//!   `{"key": "a", "time": 120}` objects, plus the distinct errors reported when
//!   a loaded file is not valid JSON or not shaped like a recording.

pub mod codec;
pub mod domain;
pub mod keymap;

pub use codec::{
    decode_recording, encode_recording, export_recording, CodecError, ExportedFile,
    MAX_NOTE_OFFSET_MS,
};
pub use domain::recording::{NoteEvent, Recording, RecordingState};
pub use keymap::key::{KeyCategory, KeyId};
pub use keymap::KeyMapper;
