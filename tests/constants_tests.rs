// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use simplesnap::constants::{self, media};

#[test]
fn test_media_file_names() {
    assert_eq!(media::photo_display_name(1700000000123), "1700000000123_image.jpg");
    assert_eq!(media::video_file_name(1700000000123), "1700000000123_video.mp4");
}

#[test]
fn test_relative_path_under_dcim() {
    assert_eq!(media::relative_path("SimpleSnap"), "DCIM/SimpleSnap");
}

#[test]
fn test_photo_defaults() {
    assert_eq!(constants::PHOTO_DISPLAY_DURATION.as_millis(), 2000);
    assert_eq!(constants::PHOTO_JPEG_QUALITY, 100);
    assert_eq!(media::PHOTO_MIME_TYPE, "image/jpeg");
    assert_eq!(media::VIDEO_MIME_TYPE, "video/mp4");
}
