//! Document rasterization and text extraction boundaries.
//!
//! Rasterizers write one PNG per page into an output directory using
//! [`page_file_name`]; the comparison side only consumes the ordered list of
//! files they return.

#[cfg(feature = "pdfium")]
pub mod pdfium;

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{DiffError, DiffResult};

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumRasterizer;

/// Renders a document to page images.
pub trait Rasterizer {
    /// Render every page of `document` into `out_dir`, returning the image
    /// paths in page order.
    fn rasterize(&self, document: &Path, out_dir: &Path) -> DiffResult<Vec<PathBuf>>;
}

/// Pulls the text layer out of a document.
pub trait TextSource {
    /// Full document text; every page ends with a newline.
    fn extract_text(&self, document: &Path) -> DiffResult<String>;
}

/// File name for a 0-based page index: `page-0001.png`, `page-0002.png`, ...
pub fn page_file_name(index: usize) -> String {
    format!("page-{:04}.png", index + 1)
}

/// Empty `dir`, creating it if needed.
pub fn prepare_output_dir(dir: &Path) -> DiffResult<()> {
    if dir.exists() {
        tracing::debug!("Clearing output directory {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Zip two page lists, refusing lists of different lengths.
pub fn pair_pages(base: Vec<PathBuf>, test: Vec<PathBuf>) -> DiffResult<Vec<(PathBuf, PathBuf)>> {
    if base.len() != test.len() {
        return Err(DiffError::PageCountMismatch {
            base: base.len(),
            test: test.len(),
        });
    }
    Ok(base.into_iter().zip(test).collect())
}

/// Rasterize both documents under `out_root/base` and `out_root/test` and
/// pair their pages.
pub fn rasterize_pair(
    rasterizer: &dyn Rasterizer,
    base: &Path,
    test: &Path,
    out_root: &Path,
) -> DiffResult<Vec<(PathBuf, PathBuf)>> {
    let base_dir = out_root.join("base");
    let test_dir = out_root.join("test");
    prepare_output_dir(&base_dir)?;
    prepare_output_dir(&test_dir)?;

    let base_pages = rasterizer.rasterize(base, &base_dir)?;
    let test_pages = rasterizer.rasterize(test, &test_dir)?;
    tracing::info!(
        "Rasterized {} base pages and {} test pages",
        base_pages.len(),
        test_pages.len()
    );
    pair_pages(base_pages, test_pages)
}
