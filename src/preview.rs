// SPDX-License-Identifier: GPL-3.0-only

//! Preview pipeline
//!
//! A producer thread pulls frames from the camera session and publishes
//! them into a single-slot hand-off; the UI consumer drains the slot at
//! its own cadence. The slot is newest-wins: an unconsumed frame is
//! discarded when the next one arrives, so delivery is
//! at-most-the-latest, never every-frame.
//!
//! The producer checks its stop signal once per frame, so stopping is
//! observed within one frame interval. Device errors terminate the loop
//! and surface exactly once through the completion channel — they are
//! never thrown across the thread boundary.

use crate::backends::camera::types::Frame;
use crate::errors::{CameraError, Result};
use crate::session::CameraSession;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Single-slot frame hand-off between producer and consumer
///
/// Holds at most one pending frame. Once invalidated no further frames
/// are accepted, so a consumer that observed the slot go idle never
/// sees a stale frame afterwards.
pub struct FrameSlot {
    inner: Mutex<SlotInner>,
}

struct SlotInner {
    frame: Option<Frame>,
    live: bool,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                frame: None,
                live: true,
            }),
        }
    }

    /// Publish a frame, discarding any unconsumed one (newest-wins).
    /// Returns false if the slot has been invalidated.
    pub fn publish(&self, frame: Frame) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.live {
            return false;
        }
        inner.frame = Some(frame);
        true
    }

    /// Drain the pending frame, if any
    pub fn take(&self) -> Option<Frame> {
        self.inner.lock().unwrap().frame.take()
    }

    /// Whether the slot still accepts frames
    pub fn is_live(&self) -> bool {
        self.inner.lock().unwrap().live
    }

    /// Empty the slot and refuse all further publishes
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.frame = None;
        inner.live = false;
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Background preview producer
///
/// `start` spawns the producer thread; `stop` signals it, waits for it
/// to finish (bounded by one frame interval) and invalidates the slot.
/// Dropping the pipeline stops it.
pub struct PreviewPipeline {
    slot: Arc<FrameSlot>,
    stop_signal: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    completion: Option<oneshot::Receiver<Result<()>>>,
}

impl PreviewPipeline {
    /// Spawn the producer over the given session
    pub fn start(session: Arc<CameraSession>) -> Self {
        let slot = Arc::new(FrameSlot::new());
        let stop_signal = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = oneshot::channel();

        let producer_slot = Arc::clone(&slot);
        let producer_stop = Arc::clone(&stop_signal);

        info!("Starting preview");
        let handle = thread::spawn(move || {
            debug!("Preview producer thread started");

            let mut frames = match session.preview() {
                Ok(frames) => frames,
                Err(e) => {
                    warn!(error = %e, "Preview stream failed to open");
                    let _ = done_tx.send(Err(CameraError::PreviewTerminated(e.to_string())));
                    return;
                }
            };

            let outcome = loop {
                // stop signal is checked once per frame
                if producer_stop.load(Ordering::SeqCst) {
                    debug!("Preview stop signal received");
                    break Ok(());
                }
                match frames.next() {
                    Ok(frame) => {
                        producer_slot.publish(frame);
                    }
                    Err(e) => {
                        warn!(error = %e, "Preview producer terminated");
                        break Err(CameraError::PreviewTerminated(e.to_string()));
                    }
                }
            };

            frames.stop();
            let _ = done_tx.send(outcome);
            debug!("Preview producer thread exiting");
        });

        Self {
            slot,
            stop_signal,
            handle: Some(handle),
            completion: Some(done_rx),
        }
    }

    /// The hand-off slot the consumer drains
    pub fn slot(&self) -> Arc<FrameSlot> {
        Arc::clone(&self.slot)
    }

    /// Whether the producer thread is still running
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Stop the producer and wait for it to finish
    ///
    /// After this returns, no frame will be delivered to the consumer:
    /// the thread has exited and the slot is invalidated.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            debug!("Waiting for preview producer to finish");
            if handle.join().is_err() {
                warn!("Preview producer thread panicked");
            }
        }
        self.slot.invalidate();
        info!("Preview stopped");
    }

    /// Producer outcome, once it has finished
    ///
    /// Delivered exactly once: `Ok(())` after a clean stop,
    /// `PreviewTerminated` if the loop ended on a device error. Returns
    /// None while the producer is running or if the outcome was already
    /// consumed.
    pub fn outcome(&mut self) -> Option<Result<()>> {
        let completion = self.completion.as_mut()?;
        match completion.try_recv() {
            Ok(result) => {
                self.completion = None;
                Some(result)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.completion = None;
                None
            }
        }
    }
}

impl Drop for PreviewPipeline {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!("PreviewPipeline dropped, stopping producer");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{Framerate, Resolution};
    use crate::backends::camera::virtual_camera::VirtualCamera;
    use crate::session::CameraSession;
    use std::time::Duration;

    fn test_frame(sequence: u64) -> Frame {
        Frame::from_rgb(2, 2, vec![0u8; 12], sequence)
    }

    fn open_session(camera: VirtualCamera) -> Arc<CameraSession> {
        let session = CameraSession::new(
            Box::new(camera),
            Some(Resolution {
                width: 32,
                height: 24,
            }),
            Some(Framerate::from_int(30)),
        );
        session.open().unwrap();
        Arc::new(session)
    }

    #[test]
    fn test_slot_newest_wins() {
        let slot = FrameSlot::new();
        assert!(slot.publish(test_frame(1)));
        assert!(slot.publish(test_frame(2)));
        // the first frame was discarded, only the newest remains
        assert_eq!(slot.take().unwrap().sequence, 2);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_slot_refuses_after_invalidate() {
        let slot = FrameSlot::new();
        slot.publish(test_frame(1));
        slot.invalidate();
        assert!(slot.take().is_none());
        assert!(!slot.publish(test_frame(2)));
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_preview_delivers_frames() {
        let session = open_session(VirtualCamera::new());
        let mut pipeline = PreviewPipeline::start(Arc::clone(&session));
        let slot = pipeline.slot();

        let mut got = None;
        for _ in 0..100 {
            if let Some(frame) = slot.take() {
                got = Some(frame);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let frame = got.expect("no frame within a second");
        assert_eq!(frame.width, 32);

        pipeline.stop();
        assert_eq!(pipeline.outcome().unwrap().ok(), Some(()));
    }

    #[test]
    fn test_no_frame_after_stop() {
        let session = open_session(VirtualCamera::new());
        let mut pipeline = PreviewPipeline::start(Arc::clone(&session));
        let slot = pipeline.slot();

        pipeline.stop();
        assert!(slot.take().is_none());
        assert!(!slot.is_live());
        std::thread::sleep(Duration::from_millis(80));
        assert!(slot.take().is_none(), "no frame may arrive after stop");
        // the session is free for a new stream
        assert!(session.preview().is_ok());
    }

    #[test]
    fn test_device_error_surfaces_once_via_completion() {
        let mut camera = VirtualCamera::new();
        camera.fail_stream_after(1);
        let session = open_session(camera);
        let mut pipeline = PreviewPipeline::start(Arc::clone(&session));

        let mut outcome = None;
        for _ in 0..100 {
            if let Some(result) = pipeline.outcome() {
                outcome = Some(result);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        match outcome {
            Some(Err(CameraError::PreviewTerminated(_))) => {}
            other => panic!("expected PreviewTerminated, got {:?}", other),
        }
        // delivered exactly once
        assert!(pipeline.outcome().is_none());
        assert!(!pipeline.is_running());
    }
}
