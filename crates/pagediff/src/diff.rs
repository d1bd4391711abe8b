//! Per-pixel difference signals between two renderings.

use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::types::{DiffError, DiffResult};

/// Fixed-point BT.601 luma weights, scaled by 2^14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Which way content contrasts with the page background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ink {
    /// Content is brighter than the background.
    #[default]
    Light,
    /// Dark ink on light paper.
    Dark,
}

/// Direction of a clipped subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Content present in the test image and absent from the base.
    Addition,
    /// Content present in the base image and absent from the test.
    Removal,
}

/// Collapse an RGB triple to 8-bit luma.
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb;
    let y = (r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B + (1 << (LUMA_SHIFT - 1)))
        >> LUMA_SHIFT;
    y.min(255) as u8
}

/// Fail unless both images share width and height.
pub fn ensure_same_dimensions(base: &RgbImage, test: &RgbImage) -> DiffResult<()> {
    if base.dimensions() != test.dimensions() {
        return Err(DiffError::DimensionMismatch {
            base_width: base.width(),
            base_height: base.height(),
            test_width: test.width(),
            test_height: test.height(),
        });
    }
    Ok(())
}

/// Symmetric difference: per channel `|a - b|`, then luma.
pub fn absolute_difference(a: &RgbImage, b: &RgbImage) -> DiffResult<GrayImage> {
    combine(a, b, |x, y| x.abs_diff(y))
}

/// Clipped subtraction: per channel `max(minuend - subtrahend, 0)`, then luma.
///
/// Captures content present in `minuend` and absent from `subtrahend`.
pub fn directional_difference(minuend: &RgbImage, subtrahend: &RgbImage) -> DiffResult<GrayImage> {
    combine(minuend, subtrahend, |x, y| x.saturating_sub(y))
}

/// Directional difference for one pass of the addition/removal pipeline.
pub fn directional_pass(
    base: &RgbImage,
    test: &RgbImage,
    direction: Direction,
    ink: Ink,
) -> DiffResult<GrayImage> {
    match (direction, ink) {
        (Direction::Addition, Ink::Light) | (Direction::Removal, Ink::Dark) => {
            directional_difference(test, base)
        }
        (Direction::Removal, Ink::Light) | (Direction::Addition, Ink::Dark) => {
            directional_difference(base, test)
        }
    }
}

fn combine(a: &RgbImage, b: &RgbImage, op: impl Fn(u8, u8) -> u8) -> DiffResult<GrayImage> {
    ensure_same_dimensions(a, b)?;

    let (w, h) = a.dimensions();
    let mut out = GrayImage::new(w, h);
    for ((pa, pb), po) in a.pixels().zip(b.pixels()).zip(out.pixels_mut()) {
        let d = [op(pa[0], pb[0]), op(pa[1], pb[1]), op(pa[2], pb[2])];
        *po = Luma([luma(d)]);
    }
    Ok(out)
}

/// Number of non-zero pixels in a mask.
pub fn count_nonzero(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p.0[0] != 0).count() as u64
}
