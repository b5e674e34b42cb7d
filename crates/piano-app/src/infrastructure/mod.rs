//! Infrastructure layer for the virtual piano.
//!
//! Contains the OS-facing adapters: terminal input capture, sample file
//! playback, the console view, TOML configuration storage, and the command
//! bridge a UI binds its controls to.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `piano_core`, but MUST NOT be imported by the domain layer.  The one
//! exception is [`input_capture::RawInputEvent`], which the application layer
//! consumes as its input vocabulary.

pub mod audio;
pub mod input_capture;
pub mod storage;
pub mod ui_bridge;
pub mod view;
