// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use simplesnap::Config;
use simplesnap::backends::camera::CameraSelector;
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.app_name, "SimpleSnap");
    assert_eq!(config.photo_display_duration(), Duration::from_secs(2));
    assert!(config.record_audio, "Audio should be recorded by default");
    assert_eq!(config.default_camera, CameraSelector::Back);
}

#[test]
fn test_config_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.photo_display_ms = 500;
    config.default_camera = CameraSelector::Front;
    config.virtual_camera.video_source = Some(dir.path().join("clip.mp4"));
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "app_name": "Snapper" }"#).unwrap();

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.app_name, "Snapper");
    assert_eq!(config.photo_display_ms, Config::default().photo_display_ms);
    assert_eq!(config.virtual_camera, Config::default().virtual_camera);
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_media_root_override() {
    let config = Config {
        media_root: Some("/srv/media".into()),
        ..Config::default()
    };
    assert_eq!(config.media_root(), std::path::PathBuf::from("/srv/media"));
}
