//! Terminal rendition of [`PianoView`].
//!
//! Pressed keys are echoed as `[a]`, the recording indicator and play control
//! are reported when they change, and a download is written straight into the
//! configured export directory.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use piano_core::{ExportedFile, KeyId};
use tracing::{info, warn};

use crate::application::view::PianoView;

pub struct ConsoleView {
    out: Mutex<Box<dyn Write + Send>>,
    export_dir: PathBuf,
    recording: AtomicBool,
}

impl ConsoleView {
    /// A view printing to standard output.
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), export_dir)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            out: Mutex::new(out),
            export_dir: export_dir.into(),
            recording: AtomicBool::new(false),
        }
    }

    /// Prints one line.  Terminal write failures are logged, not propagated.
    pub fn line(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            warn!("console write failed: {e}");
        }
    }

    fn write_export(&self, file: &ExportedFile) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(&file.file_name);
        std::fs::write(&path, file.contents.as_bytes())?;
        Ok(path)
    }
}

impl PianoView for ConsoleView {
    fn set_key_pressed(&self, key: KeyId, pressed: bool) {
        if pressed {
            self.line(&format!("[{key}]"));
        }
    }

    fn set_record_indicator(&self, active: bool, _lit: bool) {
        // Blink ticks are not echoed; only arming and disarming are.
        if self.recording.swap(active, Ordering::SeqCst) != active {
            self.line(if active { "● recording" } else { "■ recording stopped" });
        }
    }

    fn set_play_enabled(&self, enabled: bool) {
        self.line(if enabled { "▶ ready" } else { "▶ playing…" });
    }

    fn notify(&self, message: &str) {
        self.line(message);
    }

    fn offer_download(&self, file: ExportedFile) {
        match self.write_export(&file) {
            Ok(path) => {
                info!(path = %path.display(), "recording written");
                self.line(&format!("saved {}", path.display()));
            }
            Err(e) => {
                warn!(dir = %self.export_dir.display(), "failed to write recording: {e}");
                self.line("The recording could not be saved.");
            }
        }
    }
}
