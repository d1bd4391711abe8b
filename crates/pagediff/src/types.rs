//! Core data types for change regions, change sets and text diff entries.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box over a connected blob of changed pixels.
///
/// `area` is always `width * height` of the box, not the number of changed
/// pixels inside it. `pixel_count` carries the latter for callers that
/// filter on true component size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub area: u64,
    #[serde(default)]
    pub pixel_count: u64,
}

impl Region {
    /// Build a region from an inclusive pixel span.
    pub fn from_bounds(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        let width = max_x - min_x + 1;
        let height = max_y - min_y + 1;
        Self {
            x: min_x,
            y: min_y,
            width,
            height,
            area: width as u64 * height as u64,
            pixel_count: 0,
        }
    }

    /// Whether the box fits inside an image of the given size.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Which side of a comparison a change set describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Content present in the test image but not the base image.
    Addition,
    /// Content present in the base image but not the test image.
    Removal,
    /// Any difference, direction unknown.
    Generic,
}

/// Regions found by one comparison pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    pub polarity: Polarity,
    pub regions: Vec<Region>,
    /// Natural-language annotation from the description service, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ChangeSet {
    pub fn new(polarity: Polarity, regions: Vec<Region>) -> Self {
        Self {
            polarity,
            regions,
            description: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }
}

/// Result of the directional (addition + removal) pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub additions: ChangeSet,
    pub removals: ChangeSet,
}

impl Comparison {
    pub fn is_unchanged(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

/// One line of text flagged by the text diff, tagged by what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextDiffEntry {
    Addition { text: String, diff_markers: String },
    Removal { text: String, diff_markers: String },
    Modification { text: String, diff_markers: String },
}

impl TextDiffEntry {
    pub fn text(&self) -> &str {
        match self {
            TextDiffEntry::Addition { text, .. }
            | TextDiffEntry::Removal { text, .. }
            | TextDiffEntry::Modification { text, .. } => text,
        }
    }

    pub fn diff_markers(&self) -> &str {
        match self {
            TextDiffEntry::Addition { diff_markers, .. }
            | TextDiffEntry::Removal { diff_markers, .. }
            | TextDiffEntry::Modification { diff_markers, .. } => diff_markers,
        }
    }
}

/// Errors that can occur while comparing documents.
#[derive(thiserror::Error, Debug)]
pub enum DiffError {
    #[error("Error reading image {path}: {reason}")]
    ImageRead { path: String, reason: String },

    #[error("Dimension mismatch: base is {base_width}x{base_height}, test is {test_width}x{test_height}")]
    DimensionMismatch {
        base_width: u32,
        base_height: u32,
        test_width: u32,
        test_height: u32,
    },

    #[error("Both documents must have the same number of pages (base: {base}, test: {test})")]
    PageCountMismatch { base: usize, test: usize },

    #[error("Region {region:?} is outside a {width}x{height} image")]
    RegionOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },

    #[error("Encode error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rasterize error: {0}")]
    Rasterize(String),

    #[error("Text extraction error: {0}")]
    TextExtraction(String),
}

/// Convenience result type.
pub type DiffResult<T> = Result<T, DiffError>;
