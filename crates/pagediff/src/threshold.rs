//! Binarization of difference masks.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use serde::{Deserialize, Serialize};

/// Default lower bound for fixed thresholding.
pub const DEFAULT_LOW_PIXEL: u8 = 100;

/// Default upper bound for fixed thresholding.
pub const DEFAULT_HIGH_PIXEL: u8 = 255;

/// Value written for changed pixels.
pub const CHANGED: u8 = 255;

/// How a difference mask is turned into a binary mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Threshold {
    /// Pixels in `[low, high]` are changed.
    Fixed { low: u8, high: u8 },
    /// Min-max normalize, then split at the Otsu level.
    Auto,
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Fixed {
            low: DEFAULT_LOW_PIXEL,
            high: DEFAULT_HIGH_PIXEL,
        }
    }
}

/// Binarize a difference mask. Output pixels are 0 or 255.
pub fn binarize(mask: &GrayImage, threshold: Threshold) -> GrayImage {
    match threshold {
        Threshold::Fixed { low, high } => fixed(mask, low, high),
        Threshold::Auto => {
            let normalized = normalize_min_max(mask);
            let level = otsu_level(&normalized);
            tracing::debug!("Otsu level {level}");
            map_pixels(&normalized, |v| v > level)
        }
    }
}

fn fixed(mask: &GrayImage, low: u8, high: u8) -> GrayImage {
    map_pixels(mask, |v| low <= v && v <= high)
}

/// Linearly rescale intensities so the darkest pixel maps to 0 and the
/// brightest to 255. A constant mask maps to all zeros.
pub fn normalize_min_max(mask: &GrayImage) -> GrayImage {
    let (min, max) = mask
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));

    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 || max <= min {
        return GrayImage::new(w, h);
    }

    let span = (max - min) as u32;
    let mut out = GrayImage::new(w, h);
    for (src, dst) in mask.pixels().zip(out.pixels_mut()) {
        let v = (src.0[0] - min) as u32;
        *dst = Luma([((v * 255 + span / 2) / span) as u8]);
    }
    out
}

fn map_pixels(mask: &GrayImage, changed: impl Fn(u8) -> bool) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w, h);
    for (src, dst) in mask.pixels().zip(out.pixels_mut()) {
        if changed(src.0[0]) {
            *dst = Luma([CHANGED]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::count_nonzero;

    fn gradient() -> GrayImage {
        GrayImage::from_fn(16, 16, |x, y| Luma([(y * 16 + x) as u8]))
    }

    #[test]
    fn test_fixed_inclusive_bounds() {
        let mut mask = GrayImage::new(3, 1);
        mask.put_pixel(0, 0, Luma([99]));
        mask.put_pixel(1, 0, Luma([100]));
        mask.put_pixel(2, 0, Luma([255]));
        let out = binarize(&mask, Threshold::default());
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
        assert_eq!(out.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn test_fixed_is_monotonic_in_low() {
        let mask = gradient();
        let mut previous = u64::MAX;
        for low in (0..=255u8).step_by(5) {
            let count = count_nonzero(&binarize(&mask, Threshold::Fixed { low, high: 255 }));
            assert!(count <= previous, "low={low} increased changed pixels");
            previous = count;
        }
    }

    #[test]
    fn test_fixed_inverted_range_is_empty() {
        let out = binarize(&gradient(), Threshold::Fixed { low: 200, high: 100 });
        assert_eq!(count_nonzero(&out), 0);
    }

    #[test]
    fn test_output_is_binary() {
        for mode in [Threshold::default(), Threshold::Auto] {
            let out = binarize(&gradient(), mode);
            assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        }
    }

    #[test]
    fn test_normalize_stretches_range() {
        let mut mask = GrayImage::from_pixel(2, 1, Luma([10]));
        mask.put_pixel(1, 0, Luma([20]));
        let out = normalize_min_max(&mask);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn test_auto_constant_mask_is_empty() {
        let mask = GrayImage::from_pixel(8, 8, Luma([42]));
        assert_eq!(count_nonzero(&binarize(&mask, Threshold::Auto)), 0);
    }

    #[test]
    fn test_auto_separates_faint_blob() {
        // A faint blob still stands out once the range is stretched.
        let mut mask = GrayImage::new(10, 10);
        for y in 2..5 {
            for x in 2..5 {
                mask.put_pixel(x, y, Luma([12]));
            }
        }
        let out = binarize(&mask, Threshold::Auto);
        assert_eq!(count_nonzero(&out), 9);
        assert_eq!(out.get_pixel(3, 3).0[0], 255);
    }

    #[test]
    fn test_auto_is_deterministic() {
        let mask = gradient();
        assert_eq!(binarize(&mask, Threshold::Auto), binarize(&mask, Threshold::Auto));
    }
}
