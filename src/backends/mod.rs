// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera access
//!
//! - [`camera`]: the controller contract the capture pipelines are written against
//! - [`virtual_camera`]: a file-backed controller used by the CLI and for demos

pub mod camera;
pub mod virtual_camera;
