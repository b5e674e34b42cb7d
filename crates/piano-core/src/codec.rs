//! JSON codec for recording files.
//!
//! File format (UTF-8 text, content type `application/json`):
//! ```text
//! [{"key":"a","time":0},{"key":"j","time":300}]
//! ```
//! One object per note, in recording order.  `key` is the one-character key
//! name and `time` the offset in milliseconds since recording start.
//!
//! Key names are matched case-insensitively on load (`"A"` reads as `"a"`),
//! the same way keyboard input is.  Files are always written in lowercase.
//!
//! # Two kinds of load failure
//!
//! A user picking the wrong file should be told *why* it was rejected, so
//! decoding distinguishes:
//!
//! - [`CodecError::Parse`] – the bytes are not JSON text at all (binary file,
//!   truncated file, invalid UTF-8).
//! - [`CodecError::InvalidFormat`] – the text is valid JSON but not a recording:
//!   not an array, an element without `key` or `time`, or a field of the wrong
//!   type (unknown key name, negative or fractional time), or a `time` past
//!   [`MAX_NOTE_OFFSET_MS`].
//!
//! Decoding is all-or-nothing: either every element is valid and a complete
//! [`Recording`] is returned, or nothing is.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::recording::{NoteEvent, Recording};

/// Default file name offered when a recording is exported.
pub const RECORDING_FILE_NAME: &str = "recording.json";

/// MIME type of an exported recording.
pub const RECORDING_CONTENT_TYPE: &str = "application/json";

/// Largest `time` a loaded note may carry: `i32::MAX` milliseconds, about 24.8
/// days, which is also the longest delay a browser timer accepts.
pub const MAX_NOTE_OFFSET_MS: u64 = i32::MAX as u64;

/// Fields every element of a recording array must carry.
const REQUIRED_FIELDS: [&str; 2] = ["key", "time"];

/// Errors produced while encoding or decoding a recording file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The file content is not valid JSON text.
    #[error("file is not valid JSON: {0}")]
    Parse(String),

    /// The file is JSON but not shaped like a recording.
    #[error("invalid recording format: {0}")]
    InvalidFormat(String),

    /// The recording could not be serialized.
    #[error("failed to encode recording: {0}")]
    Encode(String),
}

impl CodecError {
    /// Human-readable message suitable for showing to the user.
    ///
    /// Parse and format failures read differently: a corrupt file versus a file
    /// of the wrong kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            CodecError::Parse(_) => "An error occurred while reading the file.",
            CodecError::InvalidFormat(_) => "The file is not in a valid recording format.",
            CodecError::Encode(_) => "The recording could not be saved.",
        }
    }
}

/// A serialized recording ready to be handed to the user as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: String,
    pub contents: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Serializes `recording` to its JSON text form.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use piano_core::{encode_recording, KeyId, NoteEvent, Recording};
///
/// let rec: Recording = vec![NoteEvent::new(KeyId::A, 0), NoteEvent::new(KeyId::J, 300)].into();
/// let text = encode_recording(&rec).unwrap();
/// assert_eq!(text, r#"[{"key":"a","time":0},{"key":"j","time":300}]"#);
/// ```
pub fn encode_recording(recording: &Recording) -> Result<String, CodecError> {
    serde_json::to_string(recording).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Packages `recording` as a downloadable `recording.json` file.
///
/// Returns `Ok(None)` for an empty recording: there is nothing to save, and that
/// is not an error.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn export_recording(recording: &Recording) -> Result<Option<ExportedFile>, CodecError> {
    if recording.is_empty() {
        return Ok(None);
    }
    Ok(Some(ExportedFile {
        file_name: RECORDING_FILE_NAME.to_string(),
        content_type: RECORDING_CONTENT_TYPE.to_string(),
        contents: encode_recording(recording)?,
    }))
}

/// Parses the raw bytes of a recording file.
///
/// A leading UTF-8 byte-order mark is ignored.
///
/// # Errors
///
/// - [`CodecError::Parse`] if `bytes` is not UTF-8 JSON text.
/// - [`CodecError::InvalidFormat`] if the JSON is not an array of
///   `{key, time}` objects, or a `time` exceeds [`MAX_NOTE_OFFSET_MS`].
///
/// # Examples
///
/// ```rust
/// use piano_core::{decode_recording, CodecError, KeyId};
///
/// let rec = decode_recording(br#"[{"key":"a","time":0}]"#).unwrap();
/// assert_eq!(rec.events()[0].key, KeyId::A);
///
/// assert!(matches!(decode_recording(b"not json"), Err(CodecError::Parse(_))));
/// assert!(matches!(decode_recording(br#"[{"key":"a"}]"#), Err(CodecError::InvalidFormat(_))));
/// ```
pub fn decode_recording(bytes: &[u8]) -> Result<Recording, CodecError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CodecError::Parse(format!("file is not UTF-8 text: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let value: Value = serde_json::from_str(text).map_err(|e| CodecError::Parse(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(CodecError::InvalidFormat(format!(
                "expected an array of notes, found {}",
                json_kind(&other)
            )))
        }
    };

    // Field presence is checked across the whole array before any typed
    // conversion, so a missing field is always reported as missing.
    for (index, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            CodecError::InvalidFormat(format!(
                "note {index} is {}, not an object",
                json_kind(item)
            ))
        })?;
        if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
            return Err(CodecError::InvalidFormat(format!(
                "note {index} is missing `{field}`"
            )));
        }
    }

    let events = items
        .into_iter()
        .enumerate()
        .map(|(index, mut item)| {
            if let Some(Value::String(key)) = item.get_mut("key") {
                key.make_ascii_lowercase();
            }
            let event = serde_json::from_value::<NoteEvent>(item)
                .map_err(|e| CodecError::InvalidFormat(format!("note {index}: {e}")))?;
            if event.offset_ms > MAX_NOTE_OFFSET_MS {
                return Err(CodecError::InvalidFormat(format!(
                    "note {index}: time {} exceeds {MAX_NOTE_OFFSET_MS} ms",
                    event.offset_ms
                )));
            }
            Ok(event)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let recording = Recording::from(events);
    debug!(
        notes = recording.len(),
        chronological = recording.is_chronological(),
        "decoded recording file"
    );
    Ok(recording)
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
