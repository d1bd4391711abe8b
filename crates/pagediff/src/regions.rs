//! Change region extraction from binary masks.
//!
//! Components are traced with border following over 8-connected foreground
//! pixels. Each traced border yields one axis-aligned box; boxes whose area
//! metric is at or below the noise floor are dropped. Output order is the
//! order in which borders are discovered (a raster scan), not a spatial sort.

use std::collections::HashMap;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::{Deserialize, Serialize};

use crate::types::Region;

/// Default noise floor for box filtering.
pub const DEFAULT_NOISE_FLOOR: u64 = 100;

/// Which borders become regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retrieval {
    /// Only outermost borders; blobs nested inside a hole are skipped.
    #[default]
    External,
    /// Every border, including hole borders and blobs nested inside holes.
    Tree,
}

/// Quantity compared against the noise floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaMetric {
    /// `width * height` of the bounding box.
    #[default]
    BoundingBox,
    /// Number of changed pixels in the connected component.
    PixelCount,
}

/// Options for [`extract_regions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOptions {
    pub noise_floor: u64,
    pub metric: AreaMetric,
    pub retrieval: Retrieval,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            noise_floor: DEFAULT_NOISE_FLOOR,
            metric: AreaMetric::default(),
            retrieval: Retrieval::default(),
        }
    }
}

impl RegionOptions {
    fn keeps(&self, region: &Region) -> bool {
        let value = match self.metric {
            AreaMetric::BoundingBox => region.area,
            AreaMetric::PixelCount => region.pixel_count,
        };
        value > self.noise_floor
    }
}

/// Find change regions in a binary mask. Non-zero pixels count as changed.
pub fn extract_regions(mask: &GrayImage, options: &RegionOptions) -> Vec<Region> {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let contours = find_contours::<u32>(mask);
    let pixel_counts = match options.metric {
        AreaMetric::PixelCount => Some(ComponentSizes::new(mask)),
        AreaMetric::BoundingBox => None,
    };

    let total = contours.len();
    let regions: Vec<Region> = contours
        .iter()
        .filter(|c| match options.retrieval {
            Retrieval::External => c.border_type == BorderType::Outer && c.parent.is_none(),
            Retrieval::Tree => true,
        })
        .filter_map(|c| {
            let mut region = bounding_box(c)?;
            if let Some(sizes) = &pixel_counts {
                region.pixel_count = sizes.for_contour(c);
            }
            Some(region)
        })
        .filter(|r| options.keeps(r))
        .collect();

    tracing::debug!(
        "{} borders traced, {} regions above noise floor {}",
        total,
        regions.len(),
        options.noise_floor
    );
    regions
}

/// Minimal inclusive box around a border.
fn bounding_box(contour: &Contour<u32>) -> Option<Region> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Region::from_bounds(min_x, min_y, max_x, max_y))
}

/// Pixel totals per 8-connected component.
struct ComponentSizes {
    labels: image::ImageBuffer<Luma<u32>, Vec<u32>>,
    sizes: HashMap<u32, u64>,
}

impl ComponentSizes {
    fn new(mask: &GrayImage) -> Self {
        // Labelling joins equal values only; collapse every non-zero level to one.
        let foreground = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
            Luma([if mask.get_pixel(x, y).0[0] > 0 { 255 } else { 0 }])
        });
        let labels = connected_components(&foreground, Connectivity::Eight, Luma([0u8]));
        let mut sizes = HashMap::new();
        for p in labels.pixels() {
            if p.0[0] != 0 {
                *sizes.entry(p.0[0]).or_insert(0u64) += 1;
            }
        }
        Self { labels, sizes }
    }

    fn for_contour(&self, contour: &Contour<u32>) -> u64 {
        contour
            .points
            .first()
            .map(|p| self.labels.get_pixel(p.x, p.y).0[0])
            .and_then(|label| self.sizes.get(&label).copied())
            .unwrap_or(0)
    }
}

/// Draw region outlines on a copy of `image`.
///
/// The outline hugs the region box and grows outward by `thickness - 1`
/// pixels; strokes leaving the canvas are clipped.
pub fn render_regions(image: &RgbImage, regions: &[Region], color: Rgb<u8>, thickness: u32) -> RgbImage {
    let mut canvas = image.clone();
    let thickness = thickness.max(1) as i32;
    for region in regions {
        for t in 0..thickness {
            let rect = Rect::at(region.x as i32 - t, region.y as i32 - t)
                .of_size(region.width + 2 * t as u32, region.height + 2 * t as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(rects: &[(u32, u32, u32, u32)], w: u32, h: u32) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for &(x0, y0, rw, rh) in rects {
            for y in y0..y0 + rh {
                for x in x0..x0 + rw {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
        }
        mask
    }

    fn opts(noise_floor: u64) -> RegionOptions {
        RegionOptions {
            noise_floor,
            ..RegionOptions::default()
        }
    }

    #[test]
    fn test_empty_mask_has_no_regions() {
        let mask = GrayImage::new(50, 50);
        assert!(extract_regions(&mask, &RegionOptions::default()).is_empty());
    }

    #[test]
    fn test_single_square() {
        let mask = mask_with(&[(10, 10, 20, 20)], 100, 100);
        let regions = extract_regions(&mask, &opts(100));
        assert_eq!(regions.len(), 1);
        let r = regions[0];
        assert_eq!((r.x, r.y, r.width, r.height, r.area), (10, 10, 20, 20, 400));
    }

    #[test]
    fn test_noise_floor_is_exclusive() {
        let mask = mask_with(&[(0, 0, 10, 10), (40, 40, 11, 10)], 64, 64);
        let regions = extract_regions(&mask, &opts(100));
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 110);
        for r in &regions {
            assert_eq!(r.area, r.width as u64 * r.height as u64);
            assert!(r.area > 100);
        }
    }

    #[test]
    fn test_diagonal_pixels_join_one_component() {
        let mut mask = GrayImage::new(10, 10);
        for i in 0..6 {
            mask.put_pixel(i + 2, i + 2, Luma([255]));
        }
        let regions = extract_regions(&mask, &opts(0));
        assert_eq!(regions.len(), 1);
        assert_eq!((regions[0].width, regions[0].height), (6, 6));
    }

    #[test]
    fn test_tree_retrieval_reports_hole_and_nested_blob() {
        // A 30x30 frame with a 2px wall, and a blob sitting inside the hole.
        let mut mask = mask_with(&[(5, 5, 30, 30)], 40, 40);
        for y in 7..33 {
            for x in 7..33 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        for y in 15..20 {
            for x in 15..20 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let external = extract_regions(&mask, &opts(0));
        assert_eq!(external.len(), 1);
        assert_eq!(external[0].area, 900);

        let tree = extract_regions(
            &mask,
            &RegionOptions {
                noise_floor: 0,
                retrieval: Retrieval::Tree,
                ..RegionOptions::default()
            },
        );
        assert_eq!(tree.len(), 3);
        assert!(tree.iter().any(|r| r.x == 15 && r.width == 5));
    }

    #[test]
    fn test_pixel_count_metric() {
        // A thin diagonal has a large box but few pixels.
        let mut mask = GrayImage::new(40, 40);
        for i in 0..30 {
            mask.put_pixel(i + 5, i + 5, Luma([255]));
        }
        let by_box = extract_regions(&mask, &opts(100));
        assert_eq!(by_box.len(), 1);
        assert_eq!(by_box[0].area, 900);

        let by_pixels = extract_regions(
            &mask,
            &RegionOptions {
                noise_floor: 100,
                metric: AreaMetric::PixelCount,
                ..RegionOptions::default()
            },
        );
        assert!(by_pixels.is_empty());

        let kept = extract_regions(
            &mask,
            &RegionOptions {
                noise_floor: 29,
                metric: AreaMetric::PixelCount,
                ..RegionOptions::default()
            },
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pixel_count, 30);
    }

    #[test]
    fn test_pixel_count_spans_mixed_intensities() {
        // One 10x10 blob whose halves carry different non-zero values.
        let mut mask = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                mask.put_pixel(x, y, Luma([if x < 10 { 200 } else { 255 }]));
            }
        }
        let regions = extract_regions(
            &mask,
            &RegionOptions {
                noise_floor: 60,
                metric: AreaMetric::PixelCount,
                ..RegionOptions::default()
            },
        );
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].pixel_count, 100);
        assert_eq!(regions[0].area, 100);
    }

    #[test]
    fn test_regions_stay_in_bounds() {
        let mask = mask_with(&[(0, 0, 15, 15), (85, 85, 15, 15)], 100, 100);
        for r in extract_regions(&mask, &opts(0)) {
            assert!(r.fits_within(100, 100));
        }
    }

    #[test]
    fn test_render_draws_outline_only() {
        let img = RgbImage::new(50, 50);
        let region = Region::from_bounds(10, 10, 29, 29);
        let out = render_regions(&img, &[region], Rgb([255, 0, 0]), 2);
        assert_eq!(out.get_pixel(10, 10).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(9, 20).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(20, 20).0, [0, 0, 0]);
        // Source untouched.
        assert_eq!(img.get_pixel(10, 10).0, [0, 0, 0]);
    }
}
