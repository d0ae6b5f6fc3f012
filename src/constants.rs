// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application display name, used to namespace the media directory
pub const APP_NAME: &str = "SimpleSnap";

/// How long the last captured photo stays visible in the preview card
pub const PHOTO_DISPLAY_DURATION: Duration = Duration::from_millis(2000);

/// JPEG quality used when persisting photos (maximum)
pub const PHOTO_JPEG_QUALITY: u8 = 100;

/// Media naming and MIME types
pub mod media {
    /// Top-level directory for camera output inside the media root
    pub const DCIM_DIRECTORY: &str = "DCIM";

    /// Suffix appended to the epoch-millis timestamp for photos
    pub const PHOTO_SUFFIX: &str = "_image.jpg";

    /// Suffix appended to the epoch-millis timestamp for videos
    pub const VIDEO_SUFFIX: &str = "_video.mp4";

    pub const PHOTO_MIME_TYPE: &str = "image/jpeg";
    pub const VIDEO_MIME_TYPE: &str = "video/mp4";

    /// Prefix marking a pending (not yet visible) file in the filesystem library
    pub const PENDING_PREFIX: &str = ".pending-";

    /// Relative path under the media root for an application
    pub fn relative_path(app_name: &str) -> String {
        format!("{}/{}", DCIM_DIRECTORY, app_name)
    }

    /// Photo display name for a capture timestamp
    pub fn photo_display_name(epoch_millis: i64) -> String {
        format!("{}{}", epoch_millis, PHOTO_SUFFIX)
    }

    /// Video file name for a recording timestamp
    pub fn video_file_name(epoch_millis: i64) -> String {
        format!("{}{}", epoch_millis, VIDEO_SUFFIX)
    }
}

/// Virtual camera defaults
pub mod virtual_camera {
    /// Test pattern width when no photo source is configured
    pub const PATTERN_WIDTH: u32 = 640;

    /// Test pattern height when no photo source is configured
    pub const PATTERN_HEIGHT: u32 = 480;

    /// Back lens sensor mounting (clockwise degrees), typical for phone sensors
    pub const BACK_ROTATION_DEGREES: i32 = 90;

    /// Front lens sensor mounting (clockwise degrees)
    pub const FRONT_ROTATION_DEGREES: i32 = 270;
}
