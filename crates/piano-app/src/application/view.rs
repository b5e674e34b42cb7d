//! Visible UI feedback, as seen from the application layer.
//!
//! The session never touches a widget directly; everything the user sees
//! (pressed keys, the blinking record light, the play button, messages, the
//! download prompt) goes through [`PianoView`].  The console front-end
//! implements it in `infrastructure::view`; tests use recording doubles.

use piano_core::{ExportedFile, KeyId};

/// Sink for every piece of user-visible feedback the piano produces.
///
/// Calls are fire-and-forget and must not block: they are made from timer
/// callbacks and while the session lock is held.
#[cfg_attr(test, mockall::automock)]
pub trait PianoView: Send + Sync {
    /// Shows or clears the transient "pressed" effect on `key`.
    fn set_key_pressed(&self, key: KeyId, pressed: bool);

    /// Updates the recording indicator.
    ///
    /// `active` is `true` while armed; `lit` alternates on every blink tick.
    fn set_record_indicator(&self, active: bool, lit: bool);

    /// Enables or disables the play control.
    fn set_play_enabled(&self, enabled: bool);

    /// Shows a message to the user.
    fn notify(&self, message: &str);

    /// Offers `file` to the user as a download.
    fn offer_download(&self, file: ExportedFile);
}
