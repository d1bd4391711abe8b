//! `pagediff text`: line diff of two documents' text.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use pagediff::{TextDiff, TextDiffReport};

#[derive(Args, Debug, Clone)]
pub struct TextArgs {
    /// Original document (plain text, or PDF with the `pdfium` feature).
    pub base: PathBuf,

    /// Modified document.
    pub test: PathBuf,
}

pub fn run(args: &TextArgs) -> anyhow::Result<TextDiffReport> {
    let base = load_text(&args.base)?;
    let test = load_text(&args.test)?;
    let diff = TextDiff::from_text(&base, &test);
    if diff.is_identical() {
        tracing::info!("Documents have identical text");
    }
    Ok(diff.report())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn load_text(path: &Path) -> anyhow::Result<String> {
    if is_pdf(path) {
        return load_pdf_text(path);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(feature = "pdfium")]
fn load_pdf_text(path: &Path) -> anyhow::Result<String> {
    use pagediff::raster::pdfium::{PdfiumRasterizer, DEFAULT_DPI};
    use pagediff::TextSource;

    let source = PdfiumRasterizer::new(DEFAULT_DPI)?;
    Ok(source.extract_text(path)?)
}

#[cfg(not(feature = "pdfium"))]
fn load_pdf_text(path: &Path) -> anyhow::Result<String> {
    anyhow::bail!(
        "Cannot read text from {}: PDF support requires the `pdfium` feature",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("a/b/report.PDF")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_run_on_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.txt");
        let test = dir.path().join("test.txt");
        std::fs::write(&base, "a\nb\nc\n").unwrap();
        std::fs::write(&test, "a\nx\nc\n").unwrap();

        let report = run(&TextArgs { base, test }).unwrap();
        assert_eq!(report.detailed.removals, vec!["b"]);
        assert_eq!(report.detailed.additions, vec!["x"]);
        assert_eq!(report.additions.len(), 1);
        assert_eq!(report.removals.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let args = TextArgs {
            base: PathBuf::from("/nonexistent/base.txt"),
            test: PathBuf::from("/nonexistent/test.txt"),
        };
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("base.txt"));
    }
}
