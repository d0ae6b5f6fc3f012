// SPDX-License-Identifier: MPL-2.0

//! Toggle-driven video recording
//!
//! A single [`RecordingSlot`] holds the active session. Starting checks the
//! slot and fills it under one lock, stopping takes the session out under the
//! same lock, so two toggles racing each other serialize into one start and
//! one stop.
//!
//! ```text
//!        toggle                    toggle / finalize with error
//! Idle ─────────▶ Recording ──────────────────────────────────▶ Idle
//! ```

use crate::backends::camera::{
    ActiveRecording, AudioConfig, CameraController, FileOutputOptions, VideoRecordEvent,
};
use crate::constants::media as names;
use crate::errors::RecordError;
use crate::storage::{MediaEvent, MediaPersistence};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What a toggle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordToggle {
    /// A new recording writes to `output`
    Started { output: PathBuf },
    /// The active recording was asked to stop
    Stopped,
}

/// An active recording
pub struct RecordingSession {
    id: u64,
    output: PathBuf,
    started_at: Instant,
    handle: Box<dyn ActiveRecording>,
}

impl RecordingSession {
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Mutex-guarded holder of at most one [`RecordingSession`]
#[derive(Clone, Default)]
pub struct RecordingSlot {
    session: Arc<Mutex<Option<RecordingSession>>>,
    next_id: Arc<AtomicU64>,
}

impl RecordingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<RecordingSession>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Clear the slot only if it still holds session `id`
    fn clear_if(&self, id: u64) -> bool {
        let mut slot = self.lock();
        if slot.as_ref().is_some_and(|s| s.id == id) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

/// Starts and stops recordings against a controller
#[derive(Clone)]
pub struct VideoRecorder {
    slot: RecordingSlot,
    scratch_dir: PathBuf,
    audio: AudioConfig,
    persistence: MediaPersistence,
    runtime: Handle,
}

impl VideoRecorder {
    pub fn new(
        scratch_dir: PathBuf,
        audio: AudioConfig,
        persistence: MediaPersistence,
        runtime: Handle,
    ) -> Self {
        Self {
            slot: RecordingSlot::new(),
            scratch_dir,
            audio,
            persistence,
            runtime,
        }
    }

    pub fn slot(&self) -> &RecordingSlot {
        &self.slot
    }

    /// Start a recording if idle, otherwise stop the active one
    pub fn toggle(&self, controller: &dyn CameraController) -> Result<RecordToggle, RecordError> {
        let mut slot = self.slot.lock();

        if let Some(mut session) = slot.take() {
            drop(slot);
            info!(
                output = %session.output.display(),
                elapsed_secs = session.elapsed_secs(),
                "Stopping recording"
            );
            return session
                .handle
                .stop()
                .map(|()| RecordToggle::Stopped)
                .map_err(|e| RecordError::StopFailed(e.to_string()));
        }

        std::fs::create_dir_all(&self.scratch_dir).map_err(|e| {
            RecordError::OutputUnavailable(format!("{}: {}", self.scratch_dir.display(), e))
        })?;
        let output = self
            .scratch_dir
            .join(names::video_file_name(Utc::now().timestamp_millis()));

        let id = self.slot.next_id.fetch_add(1, Ordering::SeqCst);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let listener = Box::new(move |event: VideoRecordEvent| {
            // The watcher is gone only if the runtime shut down
            let _ = events_tx.send(event);
        });

        let handle = controller
            .start_recording(
                FileOutputOptions {
                    path: output.clone(),
                },
                self.audio,
                listener,
            )
            .map_err(|e| RecordError::StartFailed(e.to_string()))?;

        *slot = Some(RecordingSession {
            id,
            output: output.clone(),
            started_at: Instant::now(),
            handle,
        });
        drop(slot);

        info!(output = %output.display(), audio = self.audio.enabled, "Recording started");

        self.runtime.spawn(watch_session(
            id,
            events_rx,
            self.slot.clone(),
            self.persistence.clone(),
        ));

        Ok(RecordToggle::Started { output })
    }
}

/// Follow one session's events until it finalizes
async fn watch_session(
    id: u64,
    mut events: mpsc::UnboundedReceiver<VideoRecordEvent>,
    slot: RecordingSlot,
    persistence: MediaPersistence,
) {
    while let Some(event) = events.recv().await {
        match event {
            VideoRecordEvent::Start => debug!(session = id, "Recording writing"),
            VideoRecordEvent::Finalize {
                output,
                error: Some(reason),
            } => {
                warn!(session = id, error = %reason, "Recording finalized with error, discarding");
                slot.clear_if(id);
                match tokio::fs::remove_file(&output).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!(path = %output.display(), error = %e, "Failed to discard output"),
                }
                persistence.publish(MediaEvent::RecordingDiscarded { output, reason });
                return;
            }
            VideoRecordEvent::Finalize { output, error: None } => {
                info!(session = id, output = %output.display(), "Recording finalized");
                persistence.persist_video(output);
                return;
            }
        }
    }

    warn!(session = id, "Recording listener dropped without finalize");
    slot.clear_if(id);
}
