// SPDX-License-Identifier: MPL-2.0

//! SimpleSnap - capture orchestration for a minimal camera application
//!
//! This library holds everything between a camera controller and the user's
//! media library: taking and orienting photos, toggling recordings, and
//! persisting both without leaving half-written entries behind.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Observable UI state and user intents
//! - [`backends`]: Camera controller abstraction and the virtual camera
//! - [`media`]: Shared media library abstraction and implementations
//! - [`pipelines`]: Photo capture and video recording pipelines
//! - [`storage`]: Background persistence into the media library
//! - [`config`]: User configuration handling
//! - [`permissions`]: Runtime permission checks
//!
//! # Example
//!
//! ```ignore
//! let persistence = MediaPersistence::new(library, &config.app_name, handle.clone());
//! let orchestrator = CaptureOrchestrator::from_config(&config, persistence, handle);
//! let photo = orchestrator.take_photo(&controller).await?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod permissions;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::CameraViewModel;
pub use config::Config;
pub use errors::{AppError, AppResult, CaptureError, PersistenceError, RecordError};
pub use pipelines::{CameraRepository, CaptureOrchestrator, CaptureResult, RecordToggle};
pub use storage::{MediaEvent, MediaPersistence};
