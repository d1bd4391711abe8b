//! pagediff: change-region extraction and text diffing for document renderings.

pub mod capture;
pub mod crop;
pub mod describe;
pub mod detector;
pub mod diff;
pub mod raster;
pub mod regions;
pub mod text_diff;
pub mod threshold;
pub mod types;

pub use capture::{load_rgb, load_rgb_from_memory};
pub use crop::{crop_changes, crop_region, encode_png_base64, CroppedRegion};
pub use describe::{prepare_content, ContentPart};
pub use detector::{ChangeDetector, DetectorConfig};
pub use diff::{absolute_difference, directional_difference, Ink};
pub use raster::{pair_pages, rasterize_pair, Rasterizer, TextSource};
pub use regions::{extract_regions, render_regions, AreaMetric, RegionOptions, Retrieval};
pub use text_diff::{split_lines, DetailedDiff, TextDiff, TextDiffReport};
pub use threshold::{binarize, Threshold};
pub use types::*;
