// SPDX-License-Identifier: MPL-2.0

//! Decoding and orientation correction for captured stills
//!
//! Turns the controller's raw [`ImageProxy`] into an upright
//! [`CaptureResult`]. The proxy is always released before returning, whether
//! decoding succeeded or not.

use super::CaptureResult;
use crate::backends::camera::types::{ImageEncoding, ImageProxy, SensorRotation};
use crate::errors::CaptureError;
use image::{ImageFormat, RgbaImage, imageops};
use tracing::debug;

/// Decode the proxy's bytes into an RGBA buffer (orientation untouched)
pub fn decode(proxy: &ImageProxy) -> Result<RgbaImage, CaptureError> {
    match proxy.encoding {
        ImageEncoding::Rgba8 => {
            let expected = (proxy.width as usize)
                .checked_mul(proxy.height as usize)
                .and_then(|pixels| pixels.checked_mul(4))
                .ok_or_else(|| {
                    CaptureError::Decode(format!(
                        "RGBA frame too large: {}x{}",
                        proxy.width, proxy.height
                    ))
                })?;
            if proxy.data().len() < expected {
                return Err(CaptureError::Decode(format!(
                    "RGBA data too small: expected {}, got {}",
                    expected,
                    proxy.data().len()
                )));
            }
            RgbaImage::from_raw(proxy.width, proxy.height, proxy.data()[..expected].to_vec())
                .ok_or_else(|| CaptureError::Decode("Failed to wrap RGBA buffer".to_string()))
        }
        ImageEncoding::Jpeg => {
            Ok(image::load_from_memory_with_format(proxy.data(), ImageFormat::Jpeg)?.to_rgba8())
        }
    }
}

/// Rotate clockwise by the sensor rotation so the image is upright
pub fn normalize_orientation(image: RgbaImage, rotation: SensorRotation) -> RgbaImage {
    match rotation {
        SensorRotation::None => image,
        SensorRotation::Rotate90 => imageops::rotate90(&image),
        SensorRotation::Rotate180 => imageops::rotate180(&image),
        SensorRotation::Rotate270 => imageops::rotate270(&image),
    }
}

/// Decode, release, and rotate a captured image
pub fn develop(proxy: ImageProxy) -> Result<CaptureResult, CaptureError> {
    let rotation = proxy.rotation();
    let decoded = decode(&proxy);
    proxy.close();

    let image = normalize_orientation(decoded?, rotation);
    debug!(
        width = image.width(),
        height = image.height(),
        %rotation,
        "Captured image developed"
    );
    Ok(CaptureResult::upright(image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// 3x2 image with a single white pixel at the top-left
    fn marked_image() -> RgbaImage {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        image
    }

    #[test]
    fn test_rotate90_swaps_dimensions_and_moves_corner() {
        let rotated = normalize_orientation(marked_image(), SensorRotation::Rotate90);
        assert_eq!(rotated.dimensions(), (2, 3));
        // Top-left moves to top-right under a clockwise quarter turn
        assert_eq!(rotated.get_pixel(1, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_rotate180_keeps_dimensions() {
        let rotated = normalize_orientation(marked_image(), SensorRotation::Rotate180);
        assert_eq!(rotated.dimensions(), (3, 2));
        assert_eq!(rotated.get_pixel(2, 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_develop_rgba_with_rotation() {
        let proxy = ImageProxy::new(3, 2, 270, ImageEncoding::Rgba8, marked_image().into_raw());
        let photo = develop(proxy).unwrap();
        assert_eq!((photo.width(), photo.height()), (2, 3));
        assert_eq!(photo.orientation(), SensorRotation::None);
    }

    #[test]
    fn test_develop_releases_proxy_on_decode_error() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let proxy = ImageProxy::new(4, 4, 0, ImageEncoding::Jpeg, b"not a jpeg".to_vec())
            .with_release_hook(move || flag.store(true, Ordering::SeqCst));

        assert!(matches!(develop(proxy), Err(CaptureError::Decode(_))));
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_rgba_dimensions_are_rejected() {
        let proxy = ImageProxy::new(u32::MAX, u32::MAX, 0, ImageEncoding::Rgba8, vec![0; 16]);
        match decode(&proxy) {
            Err(CaptureError::Decode(message)) => assert!(message.contains("too large")),
            other => panic!("unexpected result: {:?}", other.map(|i| i.dimensions())),
        }
    }

    #[test]
    fn test_short_rgba_buffer_is_rejected() {
        let proxy = ImageProxy::new(4, 4, 0, ImageEncoding::Rgba8, vec![0; 8]);
        assert!(matches!(decode(&proxy), Err(CaptureError::Decode(_))));
    }
}
