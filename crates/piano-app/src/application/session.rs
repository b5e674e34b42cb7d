//! PianoSession: one piano, one recording, five transport controls.
//!
//! The session owns the [`Recorder`] and the [`KeyDispatcher`] and is the only
//! place the two meet.  Live key presses go through [`PianoSession::trigger`];
//! replayed notes reach the same [`KeyDispatcher::trigger`] from the playback
//! plan, after checking under the lock that their playback is still current.
//! A `start_recording` that cancels a playback therefore wins against a note
//! that was already due: the note is dropped instead of landing in the new take.
//!
//! # Locking
//!
//! All mutable state sits behind one `tokio::sync::Mutex`.  The lock is only
//! ever held for bookkeeping: audio runs on its own task and timers are
//! spawned, so no lock is held across an await that waits on I/O.
//!
//! # Timers owned by the session
//!
//! | Timer     | Started by          | Cancelled by                       |
//! |-----------|---------------------|------------------------------------|
//! | blink     | `start_recording`   | `stop_recording`, `play`, `load`   |
//! | playback  | `play`              | `start_recording`, `shutdown`      |

use std::sync::{Arc, Weak};
use std::time::Duration;

use piano_core::{
    decode_recording, export_recording, CodecError, ExportedFile, KeyId, NoteEvent, Recording,
    RecordingState,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dispatch_key::{KeyDispatcher, KeyVolumes, SamplePlayer, PRESS_EFFECT_DURATION};
use super::record_playback::{PlaybackStep, Recorder, DEFAULT_PLAYBACK_GRACE};
use super::scheduler::{self, TimerHandle};
use super::view::PianoView;
use crate::infrastructure::input_capture::RawInputEvent;

/// Shown after a recording file was loaded.
pub const LOAD_SUCCESS_MESSAGE: &str = "Recording loaded successfully.";

/// Shown when a load is attempted while a recording is playing.
pub const PLAYBACK_IN_PROGRESS_MESSAGE: &str =
    "A recording is playing. Wait for it to finish before loading another.";

/// Default period of the recording indicator blink.
pub const DEFAULT_BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Error type for session controls that fail.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("playback in progress")]
    PlaybackInProgress,
}

impl SessionError {
    /// The message shown to the user for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Codec(e) => e.user_message(),
            Self::PlaybackInProgress => PLAYBACK_IN_PROGRESS_MESSAGE,
        }
    }
}

/// Durations that shape the session's visible behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub press_revert: Duration,
    pub blink_interval: Duration,
    pub playback_grace: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            press_revert: PRESS_EFFECT_DURATION,
            blink_interval: DEFAULT_BLINK_INTERVAL,
            playback_grace: DEFAULT_PLAYBACK_GRACE,
        }
    }
}

/// A point-in-time summary of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: RecordingState,
    pub events: usize,
    pub play_enabled: bool,
    /// Largest offset in the recording, 0 when empty.
    pub duration_ms: u64,
}

struct SessionInner {
    recorder: Recorder,
    blink: Option<TimerHandle>,
    playback: Option<TimerHandle>,
    play_enabled: bool,
}

impl SessionInner {
    fn stop_blink(&mut self) -> bool {
        match self.blink.take() {
            Some(blink) => {
                blink.cancel();
                true
            }
            None => false,
        }
    }

    fn stop_playback(&mut self) -> bool {
        let had_timer = match self.playback.take() {
            Some(playback) => {
                playback.cancel();
                true
            }
            None => false,
        };
        self.recorder.cancel_playback() || had_timer
    }
}

/// One piano session.  Always held in an [`Arc`]; playback needs a handle back
/// to the session to re-trigger keys.
pub struct PianoSession {
    inner: Mutex<SessionInner>,
    dispatcher: KeyDispatcher,
    view: Arc<dyn PianoView>,
    timing: SessionTiming,
}

impl PianoSession {
    /// Creates an idle session with an empty recording.
    pub fn new(
        player: Arc<dyn SamplePlayer>,
        view: Arc<dyn PianoView>,
        volumes: KeyVolumes,
        timing: SessionTiming,
    ) -> Arc<Self> {
        let dispatcher =
            KeyDispatcher::new(player, Arc::clone(&view), volumes, timing.press_revert);
        Arc::new(Self {
            inner: Mutex::new(SessionInner {
                recorder: Recorder::new(timing.playback_grace),
                blink: None,
                playback: None,
                play_enabled: true,
            }),
            dispatcher,
            view,
            timing,
        })
    }

    pub fn timing(&self) -> SessionTiming {
        self.timing
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    /// Resolves a raw key-down or pointer click and triggers the key.
    ///
    /// Returns the key that was triggered, or `None` for unbound input.
    pub async fn handle_input(&self, event: &RawInputEvent) -> Option<KeyId> {
        let Some(key) = KeyDispatcher::resolve(event) else {
            debug!(?event, "input not bound to a key");
            return None;
        };
        self.trigger(key).await;
        Some(key)
    }

    /// Triggers `key` now.  Returns the recorded event when armed.
    pub async fn trigger(&self, key: KeyId) -> Option<NoteEvent> {
        let mut inner = self.inner.lock().await;
        self.dispatcher
            .trigger(key, &mut inner.recorder, Instant::now())
    }

    // ── Transport controls ────────────────────────────────────────────────────

    /// Clears the recording and starts capturing.
    ///
    /// A running playback is cancelled first: none of its pending notes fire
    /// and the play control is re-enabled.
    pub async fn start_recording(&self) -> Uuid {
        let mut inner = self.inner.lock().await;
        if inner.stop_playback() {
            inner.play_enabled = true;
            self.view.set_play_enabled(true);
        }
        inner.stop_blink();

        let take_id = inner.recorder.start(Instant::now());
        self.view.set_record_indicator(true, true);

        let view = Arc::clone(&self.view);
        let mut lit = true;
        inner.blink = Some(scheduler::every(self.timing.blink_interval, move || {
            lit = !lit;
            view.set_record_indicator(true, lit);
            std::future::ready(())
        }));
        take_id
    }

    /// Stops capturing.  Returns `false` when nothing was being recorded.
    pub async fn stop_recording(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.recorder.stop() {
            return false;
        }
        inner.stop_blink();
        self.view.set_record_indicator(false, false);
        true
    }

    /// Replays the recording with its original timing.
    ///
    /// Returns `false` (and changes nothing) when the recording is empty or
    /// already playing.
    pub async fn play(self: &Arc<Self>) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(plan) = inner.recorder.begin_playback() else {
            return false;
        };
        if inner.stop_blink() {
            self.view.set_record_indicator(false, false);
        }
        inner.play_enabled = false;
        self.view.set_play_enabled(false);

        let session: Weak<Self> = Arc::downgrade(self);
        let generation = plan.generation;
        inner.playback = Some(scheduler::run_plan(plan.steps, move |step| {
            let session = session.clone();
            async move {
                let Some(session) = session.upgrade() else {
                    return;
                };
                match step {
                    PlaybackStep::Trigger(key) => {
                        session.replay_note(key, generation).await;
                    }
                    PlaybackStep::Finish => {
                        session.finish_playback(generation).await;
                    }
                }
            }
        }));
        true
    }

    /// Serializes the recording and offers it as `recording.json`.
    ///
    /// Returns `Ok(None)` when the recording is empty.
    pub async fn save(&self) -> Result<Option<ExportedFile>, SessionError> {
        let inner = self.inner.lock().await;
        let file = match export_recording(inner.recorder.recording()) {
            Ok(Some(file)) => file,
            Ok(None) => {
                debug!("save ignored: recording is empty");
                return Ok(None);
            }
            Err(e) => {
                warn!("failed to encode recording: {e}");
                self.view.notify(e.user_message());
                return Err(e.into());
            }
        };
        info!(
            take_id = ?inner.recorder.take_id(),
            notes = inner.recorder.recording().len(),
            bytes = file.contents.len(),
            "recording exported"
        );
        self.view.offer_download(file.clone());
        Ok(Some(file))
    }

    /// Replaces the recording with the contents of a recording file.
    ///
    /// The user is told the outcome either way.  On failure the current
    /// recording is unchanged.
    pub async fn load(&self, bytes: &[u8]) -> Result<usize, SessionError> {
        let recording = match decode_recording(bytes) {
            Ok(recording) => recording,
            Err(e) => {
                warn!("rejected recording file: {e}");
                self.view.notify(e.user_message());
                return Err(e.into());
            }
        };

        let mut inner = self.inner.lock().await;
        let notes = recording.len();
        let previous = match inner.recorder.replace(recording) {
            Ok(previous) => previous,
            Err(_) => {
                warn!("load refused: playback in progress");
                self.view.notify(PLAYBACK_IN_PROGRESS_MESSAGE);
                return Err(SessionError::PlaybackInProgress);
            }
        };
        if previous == RecordingState::Armed {
            inner.stop_blink();
            self.view.set_record_indicator(false, false);
        }
        info!(notes, "recording loaded");
        self.view.notify(LOAD_SUCCESS_MESSAGE);
        Ok(notes)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub async fn status(&self) -> SessionStatus {
        let inner = self.inner.lock().await;
        let recording = inner.recorder.recording();
        SessionStatus {
            state: inner.recorder.state(),
            events: recording.len(),
            play_enabled: inner.play_enabled,
            duration_ms: recording.last_offset_ms().unwrap_or(0),
        }
    }

    /// A copy of the current recording.
    pub async fn recording(&self) -> Recording {
        self.inner.lock().await.recorder.recording().clone()
    }

    /// Cancels every timer the session owns and returns it to `Idle`.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        inner.stop_playback();
        inner.stop_blink();
        inner.recorder.stop();
        inner.play_enabled = true;
        info!("piano session shut down");
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// Fires one replayed note if playback `generation` is still running.
    async fn replay_note(&self, key: KeyId, generation: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.recorder.is_current_playback(generation) {
            debug!(%key, generation, "note from cancelled playback dropped");
            return false;
        }
        self.dispatcher
            .trigger(key, &mut inner.recorder, Instant::now());
        true
    }

    async fn finish_playback(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.recorder.finish_playback(generation) {
            return false;
        }
        inner.playback = None;
        inner.play_enabled = true;
        self.view.set_play_enabled(true);
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatch_key::AudioError;
    use crate::application::view::MockPianoView;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::time;

    // ── Test doubles ──────────────────────────────────────────────────────────

    struct SilentPlayer;

    #[async_trait]
    impl SamplePlayer for SilentPlayer {
        async fn play(&self, _key: KeyId, _volume: f32) -> Result<(), AudioError> {
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum ViewCall {
        Pressed(KeyId, bool),
        Indicator(bool, bool),
        PlayEnabled(bool),
        Notify(String),
        Download(String),
    }

    #[derive(Default)]
    struct ViewLog {
        calls: StdMutex<Vec<ViewCall>>,
    }

    impl ViewLog {
        fn calls(&self) -> Vec<ViewCall> {
            self.calls.lock().unwrap().clone()
        }

        fn notifications(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ViewCall::Notify(m) => Some(m),
                    _ => None,
                })
                .collect()
        }

        fn indicator_calls(&self) -> Vec<(bool, bool)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ViewCall::Indicator(a, l) => Some((a, l)),
                    _ => None,
                })
                .collect()
        }
    }

    impl PianoView for ViewLog {
        fn set_key_pressed(&self, key: KeyId, pressed: bool) {
            self.calls.lock().unwrap().push(ViewCall::Pressed(key, pressed));
        }
        fn set_record_indicator(&self, active: bool, lit: bool) {
            self.calls.lock().unwrap().push(ViewCall::Indicator(active, lit));
        }
        fn set_play_enabled(&self, enabled: bool) {
            self.calls.lock().unwrap().push(ViewCall::PlayEnabled(enabled));
        }
        fn notify(&self, message: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(ViewCall::Notify(message.to_string()));
        }
        fn offer_download(&self, file: ExportedFile) {
            self.calls.lock().unwrap().push(ViewCall::Download(file.file_name));
        }
    }

    fn make_session() -> (Arc<PianoSession>, Arc<ViewLog>) {
        let view = Arc::new(ViewLog::default());
        let session = PianoSession::new(
            Arc::new(SilentPlayer),
            Arc::clone(&view) as Arc<dyn PianoView>,
            KeyVolumes::default(),
            SessionTiming::default(),
        );
        (session, view)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // ── Recording ─────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_trigger_records_only_between_start_and_stop() {
        // Arrange
        let (session, _) = make_session();

        // Act
        session.trigger(KeyId::A).await;
        session.start_recording().await;
        time::sleep(ms(120)).await;
        session.trigger(KeyId::S).await;
        session.stop_recording().await;
        session.trigger(KeyId::D).await;

        // Assert
        let recording = session.recording().await;
        assert_eq!(recording.events(), &[NoteEvent::new(KeyId::S, 120)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_toggles_while_armed_and_stops_on_stop() {
        // Arrange
        let (session, view) = make_session();

        // Act
        session.start_recording().await;
        time::sleep(ms(1100)).await;
        session.stop_recording().await;
        time::sleep(ms(2000)).await;

        // Assert – lit on start, toggled at 500 and 1000, then switched off
        assert_eq!(
            view.indicator_calls(),
            vec![(true, true), (true, false), (true, true), (false, false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_is_noop() {
        let (session, view) = make_session();
        assert!(!session.stop_recording().await);
        assert!(view.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_input_ignores_unbound_keys() {
        let (session, view) = make_session();

        let event = RawInputEvent::KeyDown {
            key: "Shift".to_string(),
            repeat: false,
        };

        assert_eq!(session.handle_input(&event).await, None);
        assert!(view.calls().is_empty());
    }

    // ── Save / load ───────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_save_offers_recording_json() {
        // Arrange
        let (session, view) = make_session();
        session.start_recording().await;
        session.trigger(KeyId::A).await;
        time::sleep(ms(300)).await;
        session.trigger(KeyId::J).await;

        // Act
        let file = session.save().await.unwrap().expect("non-empty recording");

        // Assert
        assert_eq!(file.file_name, "recording.json");
        assert_eq!(
            file.contents,
            r#"[{"key":"a","time":0},{"key":"j","time":300}]"#
        );
        assert!(view
            .calls()
            .contains(&ViewCall::Download("recording.json".to_string())));
    }

    #[tokio::test]
    async fn test_save_empty_recording_touches_nothing() {
        // Arrange – a strict mock: any view call fails the test
        let view = MockPianoView::new();
        let session = PianoSession::new(
            Arc::new(SilentPlayer),
            Arc::new(view),
            KeyVolumes::default(),
            SessionTiming::default(),
        );

        // Act
        let result = session.save().await.unwrap();

        // Assert
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_load_failure_notifies_once() {
        let mut view = MockPianoView::new();
        view.expect_notify()
            .withf(|m| m.contains("valid recording format"))
            .times(1)
            .return_const(());
        let session = PianoSession::new(
            Arc::new(SilentPlayer),
            Arc::new(view),
            KeyVolumes::default(),
            SessionTiming::default(),
        );

        let result = session.load(br#"[{"key":"a"}]"#).await;

        assert!(matches!(
            result,
            Err(SessionError::Codec(CodecError::InvalidFormat(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_replaces_recording_and_reports_success() {
        // Arrange
        let (session, view) = make_session();
        session.start_recording().await;
        session.trigger(KeyId::Z).await;

        // Act
        let notes = session
            .load(br#"[{"key":"q","time":0},{"key":"w","time":250}]"#)
            .await
            .unwrap();

        // Assert
        assert_eq!(notes, 2);
        let status = session.status().await;
        assert_eq!(status.state, RecordingState::Idle);
        assert_eq!(status.events, 2);
        assert_eq!(status.duration_ms, 250);
        assert_eq!(view.notifications(), vec![LOAD_SUCCESS_MESSAGE.to_string()]);
        assert_eq!(view.indicator_calls().last(), Some(&(false, false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_parse_error_leaves_recording_untouched() {
        let (session, view) = make_session();
        session.load(br#"[{"key":"a","time":5}]"#).await.unwrap();

        let result = session.load(b"not json").await;

        assert!(matches!(
            result,
            Err(SessionError::Codec(CodecError::Parse(_)))
        ));
        assert_eq!(
            session.recording().await.events(),
            &[NoteEvent::new(KeyId::A, 5)]
        );
        assert_eq!(
            view.notifications().last().map(String::as_str),
            Some(CodecError::Parse(String::new()).user_message())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_during_playback_is_refused() {
        // Arrange
        let (session, view) = make_session();
        session.load(br#"[{"key":"a","time":500}]"#).await.unwrap();
        assert!(session.play().await);

        // Act
        let result = session.load(br#"[{"key":"s","time":0}]"#).await;

        // Assert
        assert!(matches!(result, Err(SessionError::PlaybackInProgress)));
        assert_eq!(
            session.recording().await.events(),
            &[NoteEvent::new(KeyId::A, 500)]
        );
        assert_eq!(
            view.notifications().last().map(String::as_str),
            Some(PLAYBACK_IN_PROGRESS_MESSAGE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_note_due_before_restart_is_dropped_after_it() {
        // Arrange – a playback is running, then a new take is armed
        let (session, _) = make_session();
        session.load(br#"[{"key":"a","time":0}]"#).await.unwrap();
        assert!(session.play().await);
        // First playback of a fresh session.
        let generation = 1;
        assert!(session.inner.lock().await.recorder.is_current_playback(generation));
        session.start_recording().await;

        // Act – the old plan's note reaches the lock only now
        let fired = session.replay_note(KeyId::A, generation).await;

        // Assert
        assert!(!fired);
        assert!(session.recording().await.is_empty());
        assert_eq!(session.status().await.state, RecordingState::Armed);
    }

    // ── Status / shutdown ─────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_status_reflects_playback() {
        let (session, _) = make_session();
        session.load(br#"[{"key":"a","time":0}]"#).await.unwrap();

        session.play().await;
        let playing = session.status().await;
        time::sleep(ms(150)).await;
        let done = session.status().await;

        assert_eq!(playing.state, RecordingState::Playing);
        assert!(!playing.play_enabled);
        assert_eq!(done.state, RecordingState::Idle);
        assert!(done.play_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_playback() {
        let (session, view) = make_session();
        session
            .load(br#"[{"key":"a","time":0},{"key":"s","time":300}]"#)
            .await
            .unwrap();
        session.play().await;
        time::sleep(ms(100)).await;

        session.shutdown().await;
        time::sleep(ms(1000)).await;

        let pressed: Vec<KeyId> = view
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                ViewCall::Pressed(k, true) => Some(k),
                _ => None,
            })
            .collect();
        assert_eq!(pressed, vec![KeyId::A]);
        assert_eq!(session.status().await.state, RecordingState::Idle);
    }
}
