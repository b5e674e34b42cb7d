//! KeyDispatcher: turns raw input into a sounding, recorded key press.
//!
//! This use case runs on every key press, whether it comes from the keyboard,
//! a pointer click, or a replayed recording.  It:
//!
//! 1. Normalizes the input to a [`KeyId`] (unrecognized input is ignored).
//! 2. Plays the key's sample at its category's volume.
//! 3. Shows the pressed effect and schedules its revert.
//! 4. Appends a [`NoteEvent`] to the recording when the recorder is armed.
//!
//! # Architecture
//!
//! The dispatcher depends only on traits (`SamplePlayer`, `PianoView`) and on
//! the [`Recorder`] passed in by the caller.  Audio runs on its own task so a
//! slow or failing sample never delays steps 3 and 4.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use piano_core::{KeyCategory, KeyId, KeyMapper, NoteEvent};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::record_playback::Recorder;
use super::scheduler;
use super::view::PianoView;
use crate::infrastructure::input_capture::RawInputEvent;

/// How long a key shows its pressed effect.
pub const PRESS_EFFECT_DURATION: Duration = Duration::from_millis(150);

/// Error type for sample playback.  Never surfaced to the user.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no sample for key '{key}' at {path}")]
    SampleMissing { key: KeyId, path: PathBuf },

    #[error("failed to read sample {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("audio output refused playback: {0}")]
    Output(String),
}

/// Trait for playing the audio sample bound to a key.
///
/// Infrastructure implementations resolve a sample file; test implementations
/// record calls.
#[async_trait]
pub trait SamplePlayer: Send + Sync {
    /// Plays `key`'s sample at `volume` (0.0–1.0).
    async fn play(&self, key: KeyId, volume: f32) -> Result<(), AudioError>;
}

/// Playback volume per key category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyVolumes {
    pub white: f32,
    pub black: f32,
}

impl Default for KeyVolumes {
    fn default() -> Self {
        Self {
            white: 1.0,
            black: 0.6,
        }
    }
}

impl KeyVolumes {
    pub fn for_category(&self, category: KeyCategory) -> f32 {
        match category {
            KeyCategory::White => self.white,
            KeyCategory::Black => self.black,
        }
    }
}

/// The key dispatch use case.
pub struct KeyDispatcher {
    player: Arc<dyn SamplePlayer>,
    view: Arc<dyn PianoView>,
    volumes: KeyVolumes,
    press_effect: Duration,
}

impl KeyDispatcher {
    /// Creates a new dispatcher.
    pub fn new(
        player: Arc<dyn SamplePlayer>,
        view: Arc<dyn PianoView>,
        volumes: KeyVolumes,
        press_effect: Duration,
    ) -> Self {
        Self {
            player,
            view,
            volumes,
            press_effect,
        }
    }

    /// Maps a raw input event to the key it plays, if any.
    ///
    /// Key-down and pointer click resolve the same way downstream; transport
    /// controls and unbound keys yield `None`.
    pub fn resolve(event: &RawInputEvent) -> Option<KeyId> {
        match event {
            RawInputEvent::KeyDown { key, .. } => KeyMapper::from_key_name(key),
            RawInputEvent::PointerClick { category, index } => {
                KeyMapper::key_at(*category, *index)
            }
            RawInputEvent::Control(_) => None,
        }
    }

    /// Triggers `key`: sound, pressed effect, and capture if `recorder` is armed.
    ///
    /// The volume is chosen from the key's own category.  Returns the recorded
    /// event, if one was appended.
    pub fn trigger(&self, key: KeyId, recorder: &mut Recorder, now: Instant) -> Option<NoteEvent> {
        self.sound(key);
        self.press(key);
        recorder.record(key, now)
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn sound(&self, key: KeyId) {
        let player = Arc::clone(&self.player);
        let volume = self.volumes.for_category(key.category());
        debug!(%key, volume, "playing sample");
        tokio::spawn(async move {
            if let Err(e) = player.play(key, volume).await {
                warn!(%key, "sample playback failed: {e}");
            }
        });
    }

    fn press(&self, key: KeyId) {
        self.view.set_key_pressed(key, true);
        let view = Arc::clone(&self.view);
        // Detached: a second press of the same key does not extend the first revert.
        let _revert = scheduler::after(self.press_effect, async move {
            view.set_key_pressed(key, false);
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
