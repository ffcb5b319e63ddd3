// SPDX-License-Identifier: GPL-3.0-only

//! Shutter controller
//!
//! Orchestrates a single capture: stops the preview if it is running
//! (synchronously, so device access never overlaps), allocates the next
//! filename, performs the capture on a worker thread and reports the
//! result through an event channel. Re-entrant shutter presses are
//! rejected while a capture is in flight.

use crate::backends::camera::types::Frame;
use crate::constants::file_formats;
use crate::errors::{CameraError, Result};
use crate::preview::PreviewPipeline;
use crate::session::CameraSession;
use crate::storage::Storage;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

/// Completion events emitted by the shutter worker
///
/// Exactly one `Captured` and one `Finished` are emitted per
/// `take_picture` call, success or failure; a failure carries the error
/// in both.
#[derive(Debug)]
pub enum ShutterEvent {
    /// The captured image, loaded back from disk
    Captured(Result<Frame>),
    /// The capture finished; carries the image path on success
    Finished(Result<PathBuf>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ShutterState {
    #[default]
    Idle,
    Capturing,
}

/// Single-shot capture orchestrator
pub struct ShutterController {
    session: Arc<CameraSession>,
    storage: Arc<Mutex<Storage>>,
    state: Arc<Mutex<ShutterState>>,
    events: UnboundedSender<ShutterEvent>,
    capture_format: Mutex<String>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ShutterController {
    /// Create the controller and the receiving end of its event channel
    pub fn new(
        session: Arc<CameraSession>,
        storage: Arc<Mutex<Storage>>,
    ) -> (Self, UnboundedReceiver<ShutterEvent>) {
        let (events, receiver) = unbounded_channel();
        let controller = Self {
            session,
            storage,
            state: Arc::new(Mutex::new(ShutterState::Idle)),
            events,
            capture_format: Mutex::new(crate::constants::defaults::CAPTURE_FORMAT.to_string()),
            worker: Mutex::new(None),
        };
        (controller, receiver)
    }

    /// Whether a capture is currently in flight
    pub fn is_capturing(&self) -> bool {
        *self.state.lock().unwrap() == ShutterState::Capturing
    }

    /// Delay before the next capture, in seconds
    ///
    /// Does not affect a capture already in flight.
    pub fn set_delay(&self, seconds: u64) {
        self.session.set_capture_delay(Duration::from_secs(seconds));
    }

    /// File extension used for subsequent captures
    pub fn set_capture_format(&self, extension: &str) -> Result<()> {
        if !file_formats::is_valid_extension(extension) {
            return Err(CameraError::Storage(format!(
                "invalid extension: {}",
                extension
            )));
        }
        *self.capture_format.lock().unwrap() = extension.to_lowercase();
        Ok(())
    }

    /// Take one picture
    ///
    /// Fails fast with `ShutterBusy` if a capture is already running.
    /// An active preview is stopped before the capture begins, so the
    /// device is never touched by both at once. The capture itself runs
    /// on a worker thread; completion arrives via the event channel.
    pub fn take_picture(&self, preview: Option<&mut PreviewPipeline>) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            if *state == ShutterState::Capturing {
                return Err(CameraError::ShutterBusy);
            }
            *state = ShutterState::Capturing;
        }

        // reap the previous worker, if any
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }

        if let Some(preview) = preview
            && preview.is_running()
        {
            debug!("Stopping preview before capture");
            preview.stop();
        }

        info!("Taking picture");
        let session = Arc::clone(&self.session);
        let storage = Arc::clone(&self.storage);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let extension = self.capture_format.lock().unwrap().clone();

        let handle = thread::spawn(move || {
            let outcome = storage
                .lock()
                .unwrap()
                .get_new_name(&extension)
                .and_then(|path| session.capture(&path).map(|_| path));

            match outcome {
                Ok(path) => {
                    let loaded = Frame::from_file(&path);
                    events_send(&events, ShutterEvent::Captured(loaded));
                    events_send(&events, ShutterEvent::Finished(Ok(path)));
                }
                Err(e) => {
                    warn!(error = %e, "Capture failed");
                    events_send(&events, ShutterEvent::Captured(Err(e.clone())));
                    events_send(&events, ShutterEvent::Finished(Err(e)));
                }
            }

            *state.lock().unwrap() = ShutterState::Idle;
        });

        *self.worker.lock().unwrap() = Some(handle);
        Ok(())
    }
}

fn events_send(events: &UnboundedSender<ShutterEvent>, event: ShutterEvent) {
    if events.send(event).is_err() {
        debug!("Shutter event receiver dropped");
    }
}

impl Drop for ShutterController {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}
