//! Recorder: the `Idle` / `Armed` / `Playing` state machine.
//!
//! The recorder owns the session's single [`Recording`] and decides what each
//! transport control means in the current state.  It performs no I/O and starts
//! no timers; the caller passes in the current [`Instant`] and receives a
//! [`PlaybackPlan`] to schedule.  That keeps every transition unit-testable
//! without a runtime.
//!
//! ```text
//!            start                  stop
//!   Idle ───────────────▶ Armed ───────────────▶ Idle
//!    │                      │
//!    │ play (non-empty)     │ play (non-empty)
//!    ▼                      ▼
//!   Playing ──── finish (last offset + grace) ──▶ Idle
//!      │
//!      └──── start ──▶ Armed      (pending steps are invalidated)
//! ```
//!
//! # Playback generations
//!
//! Each playback gets a fresh generation number.  Every step of a plan is
//! checked against it before it acts: a `Trigger` from a cancelled playback
//! never sounds or records, and its `Finish` can never end a newer playback.

use std::time::Duration;

use piano_core::{KeyId, NoteEvent, Recording, RecordingState};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::scheduler::TimedStep;

/// Time the play control stays disabled after the last note fires.
pub const DEFAULT_PLAYBACK_GRACE: Duration = Duration::from_millis(100);

/// Error type for recorder transitions that are refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecorderError {
    #[error("the recording cannot be replaced while it is playing")]
    PlaybackInProgress,
}

/// One action in a playback plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStep {
    /// Re-trigger a recorded key.
    Trigger(KeyId),
    /// Playback is over: re-enable the play control and return to `Idle`.
    Finish,
}

/// Everything needed to schedule one playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackPlan {
    pub generation: u64,
    /// One `Trigger` per note in recording order, then a single `Finish`.
    pub steps: Vec<TimedStep<PlaybackStep>>,
    /// Delay of the `Finish` step: largest offset plus the grace period.
    pub length: Duration,
}

/// The recorder state machine.
#[derive(Debug)]
pub struct Recorder {
    recording: Recording,
    state: RecordingState,
    started_at: Option<Instant>,
    take_id: Option<Uuid>,
    generation: u64,
    grace: Duration,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYBACK_GRACE)
    }
}

impl Recorder {
    /// Creates an idle recorder with an empty recording.
    pub fn new(grace: Duration) -> Self {
        Self {
            recording: Recording::new(),
            state: RecordingState::Idle,
            started_at: None,
            take_id: None,
            generation: 0,
            grace,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    pub fn is_armed(&self) -> bool {
        self.state == RecordingState::Armed
    }

    pub fn is_playing(&self) -> bool {
        self.state == RecordingState::Playing
    }

    /// Identifier of the current (or last) recorded take, for log correlation.
    pub fn take_id(&self) -> Option<Uuid> {
        self.take_id
    }

    /// Clears the recording and arms capture from `now`.
    ///
    /// Valid from every state.  Calling it while armed discards the take in
    /// progress; calling it while playing invalidates the running playback.
    pub fn start(&mut self, now: Instant) -> Uuid {
        if self.is_playing() {
            self.cancel_playback();
        }
        let take_id = Uuid::new_v4();
        self.recording.clear();
        self.started_at = Some(now);
        self.take_id = Some(take_id);
        self.state = RecordingState::Armed;
        info!(%take_id, "recording armed");
        take_id
    }

    /// Disarms capture.  Returns `false` (and does nothing) unless armed.
    pub fn stop(&mut self) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.state = RecordingState::Idle;
        info!(
            take_id = ?self.take_id,
            notes = self.recording.len(),
            "recording stopped"
        );
        true
    }

    /// Captures a press of `key` at `now` if armed.
    ///
    /// Returns the appended event, or `None` when not armed.
    pub fn record(&mut self, key: KeyId, now: Instant) -> Option<NoteEvent> {
        if !self.is_armed() {
            return None;
        }
        let started_at = self.started_at?;
        let elapsed = now.saturating_duration_since(started_at);
        let offset_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let event = NoteEvent::new(key, offset_ms);
        self.recording.push(event);
        debug!(%key, offset_ms, "note recorded");
        Some(event)
    }

    /// Enters `Playing` and returns the plan to schedule.
    ///
    /// Returns `None` without changing state when the recording is empty or a
    /// playback is already running.  Starting playback while armed disarms.
    pub fn begin_playback(&mut self) -> Option<PlaybackPlan> {
        if self.is_playing() {
            debug!("play ignored: already playing");
            return None;
        }
        let last_offset_ms = match self.recording.last_offset_ms() {
            Some(ms) => ms,
            None => {
                debug!("play ignored: recording is empty");
                return None;
            }
        };

        self.generation = self.generation.wrapping_add(1);
        self.state = RecordingState::Playing;

        let length = Duration::from_millis(last_offset_ms) + self.grace;
        let mut steps: Vec<TimedStep<PlaybackStep>> = self
            .recording
            .iter()
            .map(|e| TimedStep::new(e.offset(), PlaybackStep::Trigger(e.key)))
            .collect();
        steps.push(TimedStep::new(length, PlaybackStep::Finish));

        info!(
            generation = self.generation,
            notes = self.recording.len(),
            length_ms = length.as_millis() as u64,
            "playback started"
        );
        Some(PlaybackPlan {
            generation: self.generation,
            steps,
            length,
        })
    }

    /// Returns `true` while playback `generation` is the one running.
    pub fn is_current_playback(&self, generation: u64) -> bool {
        self.is_playing() && generation == self.generation
    }

    /// Ends playback `generation`.  Returns `false` if it is no longer current.
    pub fn finish_playback(&mut self, generation: u64) -> bool {
        if !self.is_current_playback(generation) {
            return false;
        }
        self.state = RecordingState::Idle;
        info!(generation, "playback finished");
        true
    }

    /// Abandons the running playback, if any.
    pub fn cancel_playback(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        info!(generation = self.generation, "playback cancelled");
        self.generation = self.generation.wrapping_add(1);
        self.state = RecordingState::Idle;
        true
    }

    /// Replaces the recording wholesale (used by load).
    ///
    /// Returns the state the recorder was in; the recorder is `Idle` afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::PlaybackInProgress`] while playing; the current
    /// recording is left untouched.
    pub fn replace(&mut self, recording: Recording) -> Result<RecordingState, RecorderError> {
        if self.is_playing() {
            return Err(RecorderError::PlaybackInProgress);
        }
        let previous = self.state;
        self.recording = recording;
        self.state = RecordingState::Idle;
        self.started_at = None;
        self.take_id = None;
        Ok(previous)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
