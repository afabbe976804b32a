//! Page decoding and region cropping.

use crate::layout::BoundingBox;
use crate::{PagewrightError, Result};
use image::DynamicImage;
use std::path::Path;

/// Decode an encoded page image. Any decoder failure is `ImageProcessing`.
pub fn decode_page(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| PagewrightError::image_processing_with_source("Failed to decode page image", e))
}

/// Read and decode a page image from disk. Read failures are `Io`.
pub fn open_page(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_page(&bytes).map_err(|e| match e {
        PagewrightError::ImageProcessing { source, .. } => PagewrightError::ImageProcessing {
            message: format!("Failed to decode page image {}", path.as_ref().display()),
            source,
        },
        other => other,
    })
}

/// Crop `bbox` grown by `padding` and clamped to the image.
///
/// Returns the clamped box with the crop, or `None` when nothing of the box lies
/// inside the image.
pub fn crop_padded(image: &DynamicImage, bbox: &BoundingBox, padding: u32) -> Option<(BoundingBox, DynamicImage)> {
    let clamped = bbox.expand_within(padding, image.width(), image.height())?;
    let crop = image.crop_imm(
        clamped.x0() as u32,
        clamped.y0() as u32,
        clamped.width(),
        clamped.height(),
    );
    Some((clamped, crop))
}

/// Crop exactly `bbox`, clamped to the image.
pub fn crop_exact(image: &DynamicImage, bbox: &BoundingBox) -> Option<DynamicImage> {
    crop_padded(image, bbox, 0).map(|(_, crop)| crop)
}
