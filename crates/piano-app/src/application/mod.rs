//! Application layer use cases for the virtual piano.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure data and rules, here the `piano-core` crate) and the infrastructure
//! (audio files, terminal, config files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "replay the
//!   recording with the original timing").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the audio back-end or the UI can be swapped without changing this code.
//! - **Contain no audio device calls and no file system access**.
//!
//! # Sub-modules
//!
//! - **`dispatch_key`** – Normalizes raw key-down / pointer-click input to a
//!   [`piano_core::KeyId`] and triggers it: sample playback, pressed effect,
//!   and capture into the recording when armed.
//!
//! - **`record_playback`** – The recorder state machine
//!   (`Idle` / `Armed` / `Playing`) and the playback plan it produces.
//!
//! - **`scheduler`** – Cancellable timers: one-shot delays, periodic ticks and
//!   ordered `(delay, action)` plans.
//!
//! - **`session`** – One piano session: owns the recorder, wires the dispatcher
//!   to it, and exposes the five transport controls.
//!
//! - **`view`** – The trait through which the session drives visible UI
//!   feedback.

pub mod dispatch_key;
pub mod record_playback;
pub mod scheduler;
pub mod session;
pub mod view;
