//! Mock input source for unit testing.
//!
//! Allows tests to inject synthetic [`RawInputEvent`]s without a terminal.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedSender};

use super::{CaptureError, InputSource, RawInputEvent};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
pub struct MockInputSource {
    sender: Arc<Mutex<Option<UnboundedSender<RawInputEvent>>>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Injects a synthetic event, as if typed or clicked by the user.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: RawInputEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .send(event)
                .expect("receiver has been dropped; call start() first");
        } else {
            panic!("MockInputSource::inject_event called before start()");
        }
    }

    /// Injects one key-down per character of `text`.
    pub fn type_text(&self, text: &str) {
        for c in text.chars() {
            self.inject_event(RawInputEvent::key_down(c));
        }
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RawInputEvent>, CaptureError> {
        let mut guard = self.sender.lock().expect("lock poisoned");
        if guard.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::input_capture::ControlAction;
    use piano_core::KeyCategory;
    use tokio_test::assert_err;

    #[tokio::test]
    async fn test_mock_input_source_starts_and_receives_events() {
        // Arrange
        let source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.inject_event(RawInputEvent::key_down('a'));

        // Assert
        let event = rx.recv().await.expect("should receive event");
        assert!(matches!(event, RawInputEvent::KeyDown { ref key, .. } if key == "a"));
    }

    #[tokio::test]
    async fn test_mock_input_source_stop_closes_channel() {
        // Arrange
        let source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.stop();

        // Assert – channel should be disconnected
        assert!(rx.recv().await.is_none(), "channel should be closed after stop()");
    }

    #[test]
    fn test_mock_input_source_rejects_second_start() {
        let source = MockInputSource::new();
        let _rx = source.start().expect("start should succeed");

        let err = assert_err!(source.start());
        assert!(matches!(err, CaptureError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_mock_input_source_inject_multiple_event_types() {
        // Arrange
        let source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.type_text("aq");
        source.inject_event(RawInputEvent::PointerClick {
            category: KeyCategory::Black,
            index: 10,
        });
        source.inject_event(RawInputEvent::Control(ControlAction::Play));

        // Assert
        assert_eq!(rx.recv().await.unwrap(), RawInputEvent::key_down('a'));
        assert_eq!(rx.recv().await.unwrap(), RawInputEvent::key_down('q'));
        assert!(matches!(
            rx.recv().await.unwrap(),
            RawInputEvent::PointerClick { category: KeyCategory::Black, index: 10 }
        ));
        assert_eq!(
            rx.recv().await.unwrap(),
            RawInputEvent::Control(ControlAction::Play)
        );
    }
}
