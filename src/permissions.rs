// SPDX-License-Identifier: GPL-3.0-only

//! Runtime permission checks
//!
//! Capture controls need both camera and microphone access. The status is
//! queried on every request rather than cached, so a grant or revoke while the
//! app is running takes effect on the next click.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    RecordAudio,
}

/// Permissions every capture control requires
pub const CAMERA_PERMISSIONS: [Permission; 2] = [Permission::Camera, Permission::RecordAudio];

/// Source of truth for permission grants
pub trait PermissionStatus: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;
}

/// Whether all of [`CAMERA_PERMISSIONS`] are granted
pub fn are_permissions_granted(status: &dyn PermissionStatus) -> bool {
    CAMERA_PERMISSIONS.iter().all(|p| status.is_granted(*p))
}

/// Permission grants held in memory and changeable at runtime
#[derive(Debug)]
pub struct PermissionGrants {
    camera: AtomicBool,
    record_audio: AtomicBool,
}

impl PermissionGrants {
    pub fn new(camera: bool, record_audio: bool) -> Self {
        Self {
            camera: AtomicBool::new(camera),
            record_audio: AtomicBool::new(record_audio),
        }
    }

    pub fn all_granted() -> Self {
        Self::new(true, true)
    }

    pub fn set(&self, permission: Permission, granted: bool) {
        self.flag(permission).store(granted, Ordering::SeqCst);
    }

    fn flag(&self, permission: Permission) -> &AtomicBool {
        match permission {
            Permission::Camera => &self.camera,
            Permission::RecordAudio => &self.record_audio,
        }
    }
}

impl PermissionStatus for PermissionGrants {
    fn is_granted(&self, permission: Permission) -> bool {
        self.flag(permission).load(Ordering::SeqCst)
    }
}
