//! `pagediff diff`: symmetric pass over two page images.

use std::path::PathBuf;

use clap::Args;
use pagediff::{ChangeSet, DetectorConfig, Polarity};

use super::{save_gray, save_rgb, Context};

#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    /// Original page image.
    pub base: PathBuf,

    /// Modified page image.
    pub test: PathBuf,

    /// Drop regions whose area is at or below this.
    #[arg(long)]
    pub noise_floor: Option<u64>,

    /// Send base and test crops of each region to the description service.
    #[arg(long)]
    pub describe: bool,
}

/// Writes `mask.png` and `overlay.png` (boxes on the test image).
pub async fn run(ctx: &Context, args: &DiffArgs) -> anyhow::Result<ChangeSet> {
    let detector = ctx.detector(args.noise_floor, DetectorConfig::default().noise_floor);
    let (base, test) = detector.load_pair(&args.base, &args.test)?;

    let mask = detector.compute_difference(&base, &test)?;
    let regions = detector.find_changes(&mask);
    tracing::info!("Found {} changed regions", regions.len());

    let out = ctx.ensure_out_dir()?;
    save_gray(&mask, &out.join("mask.png"))?;
    save_rgb(
        &detector.visualize_changes(&test, &regions),
        &out.join("overlay.png"),
    )?;

    let mut changes = ChangeSet::new(Polarity::Generic, regions);
    if args.describe {
        let crops = detector.crop_changes(&base, &test, &changes.regions)?;
        changes.description = ctx.describe(&crops).await?;
    }

    Ok(changes)
}
