// SPDX-License-Identifier: MPL-2.0

//! Capture and recording pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │  Controller  │ ──▶ │  Photo Pipeline   │ ──▶ │  CaptureResult   │ ──▶ UI
//! │  callback    │     │  - one-shot wait  │     │                  │
//! │              │     │  - decode/rotate  │     │                  │ ──▶ Media library
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │  Controller  │ ──▶ │  Video Recorder   │ ──▶ │  Scratch .mp4    │ ──▶ Media library
//! │  recording   │     │  - toggle slot    │     │                  │
//! │              │     │  - finalize watch │     │                  │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: still capture, orientation correction, JPEG encoding
//! - [`video`]: recording session toggle
//! - [`signal`]: callback-to-future bridging

pub mod photo;
pub mod signal;
pub mod video;

pub use photo::CaptureResult;
pub use video::{RecordToggle, VideoRecorder};

use crate::backends::camera::{AudioConfig, CameraController};
use crate::config::Config;
use crate::errors::{CaptureError, RecordError};
use crate::storage::MediaPersistence;
use std::future::Future;
use tokio::runtime::Handle;
use tracing::info;

/// Capture operations the UI layer depends on
pub trait CameraRepository: Send + Sync + 'static {
    /// Capture an upright still; persistence is scheduled in the background
    fn take_photo(
        &self,
        controller: &dyn CameraController,
    ) -> impl Future<Output = Result<CaptureResult, CaptureError>> + Send;

    /// Start a recording if idle, otherwise stop the active one
    fn record_video(
        &self,
        controller: &dyn CameraController,
    ) -> impl Future<Output = Result<RecordToggle, RecordError>> + Send;
}

/// Mediates between a camera controller and media persistence
#[derive(Clone)]
pub struct CaptureOrchestrator {
    persistence: MediaPersistence,
    recorder: VideoRecorder,
}

impl CaptureOrchestrator {
    pub fn new(persistence: MediaPersistence, recorder: VideoRecorder) -> Self {
        Self {
            persistence,
            recorder,
        }
    }

    /// Build from the app config, running background work on `runtime`
    pub fn from_config(config: &Config, persistence: MediaPersistence, runtime: Handle) -> Self {
        let recorder = VideoRecorder::new(
            config.scratch_dir(),
            AudioConfig::create(config.record_audio),
            persistence.clone(),
            runtime,
        );
        Self::new(persistence, recorder)
    }

    pub fn persistence(&self) -> &MediaPersistence {
        &self.persistence
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.slot().is_active()
    }
}

impl CameraRepository for CaptureOrchestrator {
    async fn take_photo(
        &self,
        controller: &dyn CameraController,
    ) -> Result<CaptureResult, CaptureError> {
        let image = photo::capture_image(controller).await?;

        let photo = tokio::task::spawn_blocking(move || photo::develop(image))
            .await
            .map_err(|e| CaptureError::Decode(e.to_string()))??;

        info!(width = photo.width(), height = photo.height(), "Photo captured");
        self.persistence.persist_photo(photo.clone());
        Ok(photo)
    }

    async fn record_video(
        &self,
        controller: &dyn CameraController,
    ) -> Result<RecordToggle, RecordError> {
        self.recorder.toggle(controller)
    }
}
