//! Command bridge: exposes the piano session to a UI front-end.
//!
//! Every UI control maps to one async command here, and every command delegates
//! to the shared [`AppState`].  A web or desktop shell binds its buttons and
//! key handlers to these functions; the console front-end reaches them through
//! [`dispatch_event`].
//!
//! # Data Transfer Objects (DTOs)
//!
//! The session works with internal types (`KeyId`, `RecordingState`,
//! `ExportedFile`).  DTOs are flat, JSON-serialisable mirrors of them:
//!
//! - Contain only JSON-friendly fields (`String`, `u64`, `bool`).
//! - Derive `Serialize`/`Deserialize` so any shell can pass them through as-is.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`, so every
//! response has the same shape: `{ success: bool, data: T | null, error:
//! string | null }`.  The `error` text is the user-facing message.

use std::path::Path;
use std::sync::Arc;

use piano_core::{ExportedFile, KeyCategory, KeyMapper, NoteEvent, RecordingState};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::application::dispatch_key::{KeyDispatcher, SamplePlayer};
use crate::application::session::PianoSession;
use crate::application::view::PianoView;
use crate::infrastructure::input_capture::{ControlAction, RawInputEvent};
use crate::infrastructure::storage::config::AppConfig;

/// Shown when a recording file cannot be read from disk.
pub const FILE_READ_ERROR_MESSAGE: &str = "An error occurred while reading the file.";

/// Shown when `:play` finds an empty recording.
pub const NOTHING_TO_PLAY_MESSAGE: &str = "Nothing to play.";

/// Shown when `:play` arrives while a playback is running.
pub const ALREADY_PLAYING_MESSAGE: &str = "Already playing.";

/// Printed for `:help` and for unknown commands.
pub const HELP_TEXT: &str = "\
keys    white: a s d f g h j k l z x c v b n   black: q w e r t y u i o p [
        type any of them and press Enter to play
:record start a new recording
:stop   stop recording
:play   replay the recording
:save   write recording.json to the export directory
:load   <path>  load a recording file
:status show the recorder state
:quit   exit";

// ── Shared application state ──────────────────────────────────────────────────

/// Application state shared between commands.
///
/// The session carries its own lock; only the configuration needs one here.
pub struct AppState {
    pub session: Arc<PianoSession>,
    pub view: Arc<dyn PianoView>,
    pub config: Mutex<AppConfig>,
}

impl AppState {
    /// Builds a session from `config` around the given audio and view adapters.
    pub fn new(
        config: AppConfig,
        player: Arc<dyn SamplePlayer>,
        view: Arc<dyn PianoView>,
    ) -> Arc<Self> {
        let session = PianoSession::new(
            player,
            Arc::clone(&view),
            config.audio.volumes(),
            config.timing.session_timing(),
        );
        Arc::new(Self {
            session,
            view,
            config: Mutex::new(config),
        })
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// DTO for one recorded note, in the recording file's own shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDto {
    pub key: String,
    pub time: u64,
}

impl From<NoteEvent> for NoteDto {
    fn from(e: NoteEvent) -> Self {
        Self {
            key: e.key.as_str().to_string(),
            time: e.offset_ms,
        }
    }
}

/// DTO for the recorder status shown next to the transport controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDto {
    /// `"idle"`, `"armed"` or `"playing"`.
    pub state: String,
    pub events: usize,
    pub play_enabled: bool,
    pub duration_ms: u64,
}

/// DTO for a file the UI should offer as a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDto {
    pub file_name: String,
    pub content_type: String,
    pub contents: String,
}

impl From<ExportedFile> for ExportDto {
    fn from(f: ExportedFile) -> Self {
        Self {
            file_name: f.file_name,
            content_type: f.content_type,
            contents: f.contents,
        }
    }
}

/// DTO listing the two key rows left to right, for rendering the keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayoutDto {
    pub white: Vec<String>,
    pub black: Vec<String>,
}

/// Unified response wrapper used by all commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn state_name(state: RecordingState) -> &'static str {
    match state {
        RecordingState::Idle => "idle",
        RecordingState::Armed => "armed",
        RecordingState::Playing => "playing",
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Starts a new recording.  Returns the take id.
pub async fn start_recording(state: Arc<AppState>) -> CommandResult<String> {
    let take_id = state.session.start_recording().await;
    CommandResult::ok(take_id.to_string())
}

/// Stops recording.  Returns `false` when nothing was being recorded.
pub async fn stop_recording(state: Arc<AppState>) -> CommandResult<bool> {
    CommandResult::ok(state.session.stop_recording().await)
}

/// Replays the recording.  Returns `false` when there was nothing to play.
pub async fn play_recording(state: Arc<AppState>) -> CommandResult<bool> {
    CommandResult::ok(state.session.play().await)
}

/// Exports the recording.  `data` is `null` when the recording is empty.
pub async fn save_recording(state: Arc<AppState>) -> CommandResult<Option<ExportDto>> {
    match state.session.save().await {
        Ok(file) => CommandResult::ok(file.map(ExportDto::from)),
        Err(e) => CommandResult::err(e.user_message()),
    }
}

/// Replaces the recording with the contents of a recording file.
///
/// Returns the number of notes loaded.
pub async fn load_recording(state: Arc<AppState>, bytes: Vec<u8>) -> CommandResult<usize> {
    match state.session.load(&bytes).await {
        Ok(notes) => CommandResult::ok(notes),
        Err(e) => CommandResult::err(e.user_message()),
    }
}

/// Reads `path` and loads it as a recording file.
pub async fn load_recording_file(state: Arc<AppState>, path: &Path) -> CommandResult<usize> {
    match tokio::fs::read(path).await {
        Ok(bytes) => load_recording(state, bytes).await,
        Err(e) => {
            warn!(path = %path.display(), "failed to read recording file: {e}");
            state.view.notify(FILE_READ_ERROR_MESSAGE);
            CommandResult::err(FILE_READ_ERROR_MESSAGE)
        }
    }
}

/// Key-down from the UI.  `data` is the recorded note, if one was captured.
pub async fn press_key(state: Arc<AppState>, key: String) -> CommandResult<Option<NoteDto>> {
    trigger_input(&state, RawInputEvent::KeyDown { key, repeat: false }).await
}

/// Pointer click on a rendered key.
pub async fn click_key(
    state: Arc<AppState>,
    category: KeyCategory,
    index: usize,
) -> CommandResult<Option<NoteDto>> {
    trigger_input(&state, RawInputEvent::PointerClick { category, index }).await
}

async fn trigger_input(state: &AppState, event: RawInputEvent) -> CommandResult<Option<NoteDto>> {
    let Some(key) = KeyDispatcher::resolve(&event) else {
        return CommandResult::ok(None);
    };
    let note = state.session.trigger(key).await;
    CommandResult::ok(note.map(NoteDto::from))
}

/// Returns the recorder status.
pub async fn get_status(state: Arc<AppState>) -> CommandResult<StatusDto> {
    let status = state.session.status().await;
    CommandResult::ok(StatusDto {
        state: state_name(status.state).to_string(),
        events: status.events,
        play_enabled: status.play_enabled,
        duration_ms: status.duration_ms,
    })
}

/// Returns both key rows in display order.
pub async fn get_key_layout(_state: Arc<AppState>) -> CommandResult<KeyLayoutDto> {
    let row = |category: KeyCategory| -> Vec<String> {
        KeyMapper::row(category)
            .iter()
            .map(|k| k.as_str().to_string())
            .collect()
    };
    CommandResult::ok(KeyLayoutDto {
        white: row(KeyCategory::White),
        black: row(KeyCategory::Black),
    })
}

/// Returns the effective configuration.
pub async fn get_config(state: Arc<AppState>) -> CommandResult<AppConfig> {
    CommandResult::ok(state.config.lock().await.clone())
}

// ── Event loop glue ───────────────────────────────────────────────────────────

/// What the caller's event loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Routes one input event to the matching command.
///
/// Used by front-ends that produce [`RawInputEvent`]s rather than calling the
/// commands directly.  Informational commands answer through the view.
pub async fn dispatch_event(state: &Arc<AppState>, event: RawInputEvent) -> Flow {
    let action = match event {
        RawInputEvent::Control(action) => action,
        input => {
            state.session.handle_input(&input).await;
            return Flow::Continue;
        }
    };

    match action {
        ControlAction::Record => {
            start_recording(Arc::clone(state)).await;
        }
        ControlAction::Stop => {
            if !stop_recording(Arc::clone(state)).await.data.unwrap_or(false) {
                state.view.notify("Not recording.");
            }
        }
        ControlAction::Play => {
            if !play_recording(Arc::clone(state)).await.data.unwrap_or(false) {
                let message = if state.session.status().await.state == RecordingState::Playing {
                    ALREADY_PLAYING_MESSAGE
                } else {
                    NOTHING_TO_PLAY_MESSAGE
                };
                state.view.notify(message);
            }
        }
        ControlAction::Save => {
            if let CommandResult { data: Some(None), .. } = save_recording(Arc::clone(state)).await
            {
                state.view.notify("Nothing to save.");
            }
        }
        ControlAction::Load(path) => {
            load_recording_file(Arc::clone(state), &path).await;
        }
        ControlAction::Status => {
            if let Some(status) = get_status(Arc::clone(state)).await.data {
                state.view.notify(&format!(
                    "state: {} | notes: {} | length: {} ms | play: {}",
                    status.state,
                    status.events,
                    status.duration_ms,
                    if status.play_enabled { "enabled" } else { "disabled" }
                ));
            }
        }
        ControlAction::Help => state.view.notify(HELP_TEXT),
        ControlAction::Quit => {
            info!("quit requested");
            return Flow::Quit;
        }
    }
    Flow::Continue
}

// ── Tests ─────────────────────────────────────────────────────────────────────
