//! Change detection between two renderings of the same page.

use std::path::Path;

use image::{GrayImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::capture::load_rgb;
use crate::crop::{crop_changes, CroppedRegion};
use crate::diff::{absolute_difference, directional_pass, ensure_same_dimensions, Direction, Ink};
use crate::regions::{
    extract_regions, render_regions, AreaMetric, RegionOptions, Retrieval, DEFAULT_NOISE_FLOOR,
};
use crate::threshold::{binarize, Threshold, DEFAULT_HIGH_PIXEL, DEFAULT_LOW_PIXEL};
use crate::types::{ChangeSet, Comparison, DiffResult, Polarity, Region};

/// Tunables for a [`ChangeDetector`]. Missing fields in a config file fall
/// back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Lower bound of the fixed threshold used by the symmetric pass.
    pub low_pixel: u8,
    /// Upper bound of the fixed threshold used by the symmetric pass.
    pub high_pixel: u8,
    /// Regions whose area metric is at or below this are dropped.
    pub noise_floor: u64,
    pub area_metric: AreaMetric,
    /// Border retrieval for the symmetric pass.
    pub retrieval: Retrieval,
    /// Border retrieval for the addition and removal passes.
    pub directional_retrieval: Retrieval,
    pub ink: Ink,
    /// Outline color for rendered overlays.
    pub box_color: [u8; 3],
    pub box_thickness: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            low_pixel: DEFAULT_LOW_PIXEL,
            high_pixel: DEFAULT_HIGH_PIXEL,
            noise_floor: DEFAULT_NOISE_FLOOR,
            area_metric: AreaMetric::BoundingBox,
            retrieval: Retrieval::External,
            directional_retrieval: Retrieval::Tree,
            ink: Ink::Light,
            box_color: [255, 0, 0],
            box_thickness: 2,
        }
    }
}

impl DetectorConfig {
    fn options(&self, retrieval: Retrieval) -> RegionOptions {
        RegionOptions {
            noise_floor: self.noise_floor,
            metric: self.area_metric,
            retrieval,
        }
    }
}

/// Runs the difference, binarization and region passes with a fixed config.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    config: DetectorConfig,
}

impl ChangeDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Load a base/test pair, failing early if their sizes differ.
    pub fn load_pair(
        &self,
        base: impl AsRef<Path>,
        test: impl AsRef<Path>,
    ) -> DiffResult<(RgbImage, RgbImage)> {
        let base = load_rgb(base)?;
        let test = load_rgb(test)?;
        ensure_same_dimensions(&base, &test)?;
        Ok((base, test))
    }

    /// Symmetric difference binarized with the fixed threshold.
    pub fn compute_difference(&self, base: &RgbImage, test: &RgbImage) -> DiffResult<GrayImage> {
        let diff = absolute_difference(base, test)?;
        Ok(binarize(
            &diff,
            Threshold::Fixed {
                low: self.config.low_pixel,
                high: self.config.high_pixel,
            },
        ))
    }

    /// Binary mask of content present in `test` and absent from `base`.
    pub fn find_additions(&self, base: &RgbImage, test: &RgbImage) -> DiffResult<GrayImage> {
        let diff = directional_pass(base, test, Direction::Addition, self.config.ink)?;
        Ok(binarize(&diff, Threshold::Auto))
    }

    /// Binary mask of content present in `base` and absent from `test`.
    pub fn find_removals(&self, base: &RgbImage, test: &RgbImage) -> DiffResult<GrayImage> {
        let diff = directional_pass(base, test, Direction::Removal, self.config.ink)?;
        Ok(binarize(&diff, Threshold::Auto))
    }

    /// Regions of a symmetric-pass mask.
    pub fn find_changes(&self, mask: &GrayImage) -> Vec<Region> {
        extract_regions(mask, &self.config.options(self.config.retrieval))
    }

    /// Regions of an addition or removal mask.
    pub fn find_directional_changes(&self, mask: &GrayImage) -> Vec<Region> {
        extract_regions(mask, &self.config.options(self.config.directional_retrieval))
    }

    /// Overlay region outlines on a copy of `image`.
    pub fn visualize_changes(&self, image: &RgbImage, regions: &[Region]) -> RgbImage {
        render_regions(
            image,
            regions,
            Rgb(self.config.box_color),
            self.config.box_thickness,
        )
    }

    /// Crop every region from both images, base crops first.
    pub fn crop_changes(
        &self,
        base: &RgbImage,
        test: &RgbImage,
        regions: &[Region],
    ) -> DiffResult<Vec<CroppedRegion>> {
        crop_changes(&[base, test], regions)
    }

    /// Symmetric pass: where do the two images differ at all.
    pub fn compare_generic(&self, base: &RgbImage, test: &RgbImage) -> DiffResult<ChangeSet> {
        let mask = self.compute_difference(base, test)?;
        let regions = self.find_changes(&mask);
        tracing::info!("Generic pass: {} regions", regions.len());
        Ok(ChangeSet::new(Polarity::Generic, regions))
    }

    /// Addition and removal passes.
    pub fn compare(&self, base: &RgbImage, test: &RgbImage) -> DiffResult<Comparison> {
        let added = self.find_additions(base, test)?;
        let removed = self.find_removals(base, test)?;
        Ok(self.compare_masks(&added, &removed))
    }

    /// Build a [`Comparison`] from addition and removal masks already computed.
    pub fn compare_masks(&self, added: &GrayImage, removed: &GrayImage) -> Comparison {
        let comparison = Comparison {
            additions: ChangeSet::new(Polarity::Addition, self.find_directional_changes(added)),
            removals: ChangeSet::new(Polarity::Removal, self.find_directional_changes(removed)),
        };
        tracing::info!(
            "Directional pass: {} additions, {} removals",
            comparison.additions.len(),
            comparison.removals.len()
        );
        comparison
    }
}
