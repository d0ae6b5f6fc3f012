// SPDX-License-Identifier: MPL-2.0

//! Still capture from a camera controller
//!
//! Bridges the controller's success/error callback pair into a future that
//! resolves exactly once.

use crate::backends::camera::{
    CameraController, ImageCaptureError, ImageProxy, OnImageCapturedCallback,
};
use crate::errors::CaptureError;
use crate::pipelines::signal::CompletionSignal;
use tracing::{debug, error};

type CaptureOutcome = Result<ImageProxy, ImageCaptureError>;

/// Callback registered with the controller for one capture
struct CaptureCallback {
    signal: CompletionSignal<CaptureOutcome>,
}

impl OnImageCapturedCallback for CaptureCallback {
    fn on_capture_success(&self, image: ImageProxy) {
        if let Err(Ok(image)) = self.signal.complete(Ok(image)) {
            debug!("Capture result arrived with nobody waiting, releasing image");
            image.close();
        }
    }

    fn on_error(&self, error: ImageCaptureError) {
        if self.signal.complete(Err(error)).is_err() {
            debug!("Capture error arrived with nobody waiting");
        }
    }
}

/// Request a still from the controller and wait for its callback
///
/// Dropping the returned future before the callback fires is safe: the late
/// callback finds nobody waiting and releases the image.
pub async fn capture_image(controller: &dyn CameraController) -> Result<ImageProxy, CaptureError> {
    let (signal, waiter) = CompletionSignal::new();
    controller.take_picture(Box::new(CaptureCallback { signal }));

    match waiter.await {
        Ok(Ok(image)) => {
            debug!(?image, "Capture callback delivered image");
            Ok(image)
        }
        Ok(Err(e)) => {
            debug!(error = %e, "Capture callback reported an error");
            Err(CaptureError::Platform(e.to_string()))
        }
        Err(_) => {
            error!("Controller dropped the capture callback");
            Err(CaptureError::Abandoned)
        }
    }
}
