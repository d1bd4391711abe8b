//! PDFium-backed rasterizer and text source.

use std::path::{Path, PathBuf};

use pdfium_render::prelude::*;

use super::{page_file_name, Rasterizer, TextSource};
use crate::types::{DiffError, DiffResult};

/// Default render resolution.
pub const DEFAULT_DPI: f32 = 200.0;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    dpi: f32,
}

impl PdfiumRasterizer {
    /// Bind to `libpdfium` in the working directory, falling back to the
    /// system library path.
    pub fn new(dpi: f32) -> DiffResult<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| DiffError::Rasterize(format!("Failed to load PDFium library: {e}")))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
            dpi,
        })
    }

    fn open<'a>(&'a self, document: &Path) -> DiffResult<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_file(document, None)
            .map_err(|e| DiffError::Rasterize(format!("Failed to load PDF {}: {e}", document.display())))
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, document: &Path, out_dir: &Path) -> DiffResult<Vec<PathBuf>> {
        let pdf = self.open(document)?;
        let scale = self.dpi / POINTS_PER_INCH;
        let mut pages = Vec::new();

        for (index, page) in pdf.pages().iter().enumerate() {
            let config = PdfRenderConfig::new()
                .set_target_width((page.width().value * scale) as i32)
                .set_target_height((page.height().value * scale) as i32)
                .render_form_data(true)
                .render_annotations(true);
            let bitmap = page.render_with_config(&config).map_err(|e| {
                DiffError::Rasterize(format!("Failed to render page {}: {e}", index + 1))
            })?;

            let path = out_dir.join(page_file_name(index));
            bitmap.as_image().to_rgb8().save(&path)?;
            tracing::debug!("Rendered {} page {} to {}", document.display(), index + 1, path.display());
            pages.push(path);
        }
        Ok(pages)
    }
}

impl TextSource for PdfiumRasterizer {
    fn extract_text(&self, document: &Path) -> DiffResult<String> {
        let pdf = self.open(document)?;
        let mut text = String::new();
        for (index, page) in pdf.pages().iter().enumerate() {
            let page_text = page.text().map_err(|e| {
                DiffError::TextExtraction(format!("Page {} of {}: {e}", index + 1, document.display()))
            })?;
            text.push_str(&page_text.all());
            text.push('\n');
        }
        Ok(text)
    }
}
