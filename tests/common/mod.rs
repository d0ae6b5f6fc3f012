// SPDX-License-Identifier: MPL-2.0

//! Shared fixtures for integration tests

#![allow(dead_code)]

use simplesnap::backends::camera::{
    ActiveRecording, AudioConfig, BackendError, BackendResult, CameraController, CameraSelector,
    FileOutputOptions, ImageCaptureError, OnImageCapturedCallback, VideoRecordEvent,
    VideoRecordListener,
};
use simplesnap::backends::virtual_camera::test_pattern_frame;
use simplesnap::media::InMemoryMediaLibrary;
use simplesnap::pipelines::video::VideoRecorder;
use simplesnap::{CaptureOrchestrator, MediaEvent, MediaPersistence};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

pub const APP_NAME: &str = "SimpleSnap";

/// How the mock answers `take_picture`
#[derive(Debug, Clone)]
pub enum CaptureBehavior {
    /// Deliver a test pattern with the given sensor rotation
    Succeed {
        width: u32,
        height: u32,
        rotation: i32,
    },
    /// Deliver a capture error
    Fail(String),
    /// Deliver a success followed by an error for the same request
    SucceedThenFail,
    /// Drop the callback without invoking it
    Drop,
    /// Keep the callback until [`MockController::deliver_held`]
    Hold,
}

/// Scripted camera controller delivering callbacks inline
pub struct MockController {
    behavior: Mutex<CaptureBehavior>,
    held: Mutex<Option<Box<dyn OnImageCapturedCallback>>>,
    released: Arc<AtomicUsize>,
    bound: AtomicBool,
    fail_start: AtomicBool,
    selector: Mutex<CameraSelector>,
    starts: AtomicUsize,
    stops: Arc<AtomicUsize>,
    recording: Mutex<Option<(PathBuf, VideoRecordListener)>>,
}

impl MockController {
    pub fn new(behavior: CaptureBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            held: Mutex::new(None),
            released: Arc::new(AtomicUsize::new(0)),
            bound: AtomicBool::new(true),
            fail_start: AtomicBool::new(false),
            selector: Mutex::new(CameraSelector::Back),
            starts: AtomicUsize::new(0),
            stops: Arc::new(AtomicUsize::new(0)),
            recording: Mutex::new(None),
        }
    }

    pub fn succeeding(width: u32, height: u32, rotation: i32) -> Self {
        Self::new(CaptureBehavior::Succeed {
            width,
            height,
            rotation,
        })
    }

    pub fn set_behavior(&self, behavior: CaptureBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn fail_next_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    /// Number of captured images whose buffer was released
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Output path of the recording waiting to be finalized
    pub fn recording_output(&self) -> Option<PathBuf> {
        self.recording.lock().unwrap().as_ref().map(|(p, _)| p.clone())
    }

    fn frame(&self, width: u32, height: u32, rotation: i32) -> simplesnap::backends::camera::ImageProxy {
        let released = Arc::clone(&self.released);
        test_pattern_frame(width, height, rotation).with_release_hook(move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Invoke a held callback with a 4x2 frame
    pub fn deliver_held(&self) {
        let callback = self.held.lock().unwrap().take().expect("no held callback");
        callback.on_capture_success(self.frame(4, 2, 0));
    }

    /// Finish the current recording, writing `payload` on success
    pub fn finalize(&self, result: Result<&[u8], &str>) {
        let (output, mut listener) = self
            .recording
            .lock()
            .unwrap()
            .take()
            .expect("no recording to finalize");

        let error = match result {
            Ok(payload) => {
                std::fs::write(&output, payload).unwrap();
                None
            }
            Err(reason) => {
                std::fs::write(&output, b"partial").unwrap();
                Some(reason.to_string())
            }
        };
        listener(VideoRecordEvent::Finalize { output, error });
    }
}

impl CameraController for MockController {
    fn bind_to_lifecycle(&self) -> BackendResult<()> {
        self.bound.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unbind(&self) {
        self.bound.store(false, Ordering::SeqCst);
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    fn take_picture(&self, callback: Box<dyn OnImageCapturedCallback>) {
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            CaptureBehavior::Succeed {
                width,
                height,
                rotation,
            } => callback.on_capture_success(self.frame(width, height, rotation)),
            CaptureBehavior::Fail(message) => {
                callback.on_error(ImageCaptureError { code: 3, message })
            }
            CaptureBehavior::SucceedThenFail => {
                callback.on_capture_success(self.frame(4, 2, 0));
                callback.on_error(ImageCaptureError {
                    code: 4,
                    message: "late error".into(),
                });
            }
            CaptureBehavior::Drop => drop(callback),
            CaptureBehavior::Hold => *self.held.lock().unwrap() = Some(callback),
        }
    }

    fn start_recording(
        &self,
        output: FileOutputOptions,
        _audio: AudioConfig,
        mut listener: VideoRecordListener,
    ) -> BackendResult<Box<dyn ActiveRecording>> {
        if self.fail_start.swap(false, Ordering::SeqCst) {
            return Err(BackendError::Other("encoder unavailable".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        listener(VideoRecordEvent::Start);
        *self.recording.lock().unwrap() = Some((output.path, listener));
        Ok(Box::new(MockRecording {
            stops: Arc::clone(&self.stops),
        }))
    }

    fn camera_selector(&self) -> CameraSelector {
        *self.selector.lock().unwrap()
    }

    fn set_camera_selector(&self, selector: CameraSelector) {
        *self.selector.lock().unwrap() = selector;
    }
}

struct MockRecording {
    stops: Arc<AtomicUsize>,
}

impl ActiveRecording for MockRecording {
    fn stop(&mut self) -> BackendResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Persistence into `library` on the current runtime
pub fn persistence(library: Arc<InMemoryMediaLibrary>) -> MediaPersistence {
    MediaPersistence::new(library, APP_NAME, Handle::current())
}

/// Orchestrator over an in-memory library, recording into `scratch`
pub fn orchestrator(library: Arc<InMemoryMediaLibrary>, scratch: &Path) -> CaptureOrchestrator {
    let persistence = persistence(library);
    let recorder = VideoRecorder::new(
        scratch.to_path_buf(),
        AudioConfig::create(true),
        persistence.clone(),
        Handle::current(),
    );
    CaptureOrchestrator::new(persistence, recorder)
}

/// Next media event, failing the test if none arrives
pub async fn next_event(events: &mut broadcast::Receiver<MediaEvent>) -> MediaEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for media event")
        .expect("media event channel closed")
}

/// Poll `condition` until it holds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}
