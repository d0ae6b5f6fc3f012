// SPDX-License-Identifier: MPL-2.0

//! Application layer
//!
//! The UI itself is an external collaborator. This module holds what it
//! observes and the intents it forwards.
//!
//! - `state`: [`CameraViewModel`], the observable state holder

mod state;

pub use state::CameraViewModel;

use crate::backends::camera::CameraController;
use crate::config::Config;
use crate::permissions::PermissionStatus;
use crate::pipelines::CaptureOrchestrator;
use std::sync::Arc;

/// Wire a view model over the orchestrator using the app config
pub fn build_view_model(
    config: &Config,
    orchestrator: Arc<CaptureOrchestrator>,
    controller: Arc<dyn CameraController>,
    permissions: Arc<dyn PermissionStatus>,
) -> CameraViewModel<CaptureOrchestrator> {
    let gallery_dir = orchestrator.persistence().media_dir();
    CameraViewModel::new(
        orchestrator,
        controller,
        permissions,
        config.photo_display_duration(),
    )
    .with_gallery_dir(gallery_dir)
}
