//! `pagediff pdf`: rasterize two PDFs and compare them page by page.

use std::path::PathBuf;

use clap::Args;
use pagediff::raster::pdfium::{PdfiumRasterizer, DEFAULT_DPI};
use pagediff::{rasterize_pair, DetectorConfig};

use super::page::{compare_page, PageOptions, PageReport};
use super::Context;
use crate::config::DIRECTIONAL_NOISE_FLOOR;

#[derive(Args, Debug, Clone)]
pub struct PdfArgs {
    /// Original document.
    pub base: PathBuf,

    /// Modified document. Must have the same page count.
    pub test: PathBuf,

    /// Render resolution.
    #[arg(long, default_value_t = DEFAULT_DPI)]
    pub dpi: f32,

    /// Run the addition/removal passes instead of the symmetric one.
    #[arg(long)]
    pub directional: bool,

    /// Drop regions whose area is at or below this.
    #[arg(long)]
    pub noise_floor: Option<u64>,

    /// Send each page's cropped changes to the description service.
    #[arg(long)]
    pub describe: bool,
}

/// Pages are rendered under `<out>/pages/{base,test}`; overlays go to
/// `<out>/overlay/`.
pub async fn run(ctx: &Context, args: &PdfArgs) -> anyhow::Result<Vec<PageReport>> {
    let default_floor = if args.directional {
        DIRECTIONAL_NOISE_FLOOR
    } else {
        DetectorConfig::default().noise_floor
    };
    let detector = ctx.detector(args.noise_floor, default_floor);

    let out = ctx.ensure_out_dir()?;
    let rasterizer = PdfiumRasterizer::new(args.dpi)?;
    let pairs = rasterize_pair(&rasterizer, &args.base, &args.test, &out.join("pages"))?;

    let overlay_dir = out.join("overlay");
    std::fs::create_dir_all(&overlay_dir)?;

    let options = PageOptions {
        directional: args.directional,
        describe: args.describe,
    };
    let mut reports = Vec::with_capacity(pairs.len());
    for (index, (base_path, test_path)) in pairs.iter().enumerate() {
        let (base, test) = detector.load_pair(base_path, test_path)?;
        let report =
            compare_page(ctx, &detector, index + 1, &base, &test, &overlay_dir, options).await?;
        reports.push(report);
    }

    Ok(reports)
}
