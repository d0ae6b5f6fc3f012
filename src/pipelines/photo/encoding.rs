// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding for persisted photos

use crate::errors::PersistenceError;
use image::{RgbImage, RgbaImage};
use std::io::Write;
use tracing::debug;

/// Encode an RGBA image as JPEG into `writer`
///
/// JPEG carries no alpha channel, so alpha is dropped first.
pub fn encode_jpeg<W: Write>(
    image: &RgbaImage,
    quality: u8,
    writer: W,
) -> Result<(), PersistenceError> {
    let rgb = convert_rgba_to_rgb(image)?;

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PersistenceError::WriteFailed(format!("JPEG encoding failed: {}", e)))?;

    debug!(width = rgb.width(), height = rgb.height(), quality, "JPEG encoded");
    Ok(())
}

/// Convert RGBA data to an RGB image (drop alpha channel)
fn convert_rgba_to_rgb(image: &RgbaImage) -> Result<RgbImage, PersistenceError> {
    let rgb_data: Vec<u8> = image
        .as_raw()
        .chunks_exact(4)
        .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
        .collect();

    RgbImage::from_raw(image.width(), image.height(), rgb_data).ok_or_else(|| {
        PersistenceError::WriteFailed("Failed to create RGB image from converted data".into())
    })
}
