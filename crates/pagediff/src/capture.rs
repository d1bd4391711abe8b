//! Image loading into RGB pixel grids.

use std::path::Path;

use image::{DynamicImage, RgbImage};

use crate::types::{DiffError, DiffResult};

/// Load an image from a file path and normalize it to 8-bit RGB.
///
/// Grayscale, palette and alpha encodings are all converted; alpha is dropped.
/// The format is sniffed from the file contents, not the extension.
pub fn load_rgb(path: impl AsRef<Path>) -> DiffResult<RgbImage> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| DiffError::ImageRead {
        path: label.clone(),
        reason: e.to_string(),
    })?;
    load_rgb_from_memory(&bytes, &label)
}

/// Decode an in-memory image. `label` stands in for the path in error messages.
pub fn load_rgb_from_memory(bytes: &[u8], label: &str) -> DiffResult<RgbImage> {
    let img = image::load_from_memory(bytes).map_err(|e| DiffError::ImageRead {
        path: label.to_string(),
        reason: e.to_string(),
    })?;
    tracing::debug!(
        "Loaded {} ({}x{}, {:?})",
        label,
        img.width(),
        img.height(),
        img.color()
    );
    Ok(to_rgb(img))
}

fn to_rgb(img: DynamicImage) -> RgbImage {
    match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}
