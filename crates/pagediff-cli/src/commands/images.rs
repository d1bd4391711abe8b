//! `pagediff images`: addition and removal passes over two page images.

use std::path::PathBuf;

use clap::Args;
use pagediff::{crop_changes, Comparison};

use super::{save_gray, save_rgb, Context};
use crate::config::DIRECTIONAL_NOISE_FLOOR;

#[derive(Args, Debug, Clone)]
pub struct ImagesArgs {
    /// Original page image.
    pub base: PathBuf,

    /// Modified page image.
    pub test: PathBuf,

    /// Drop regions whose area is at or below this.
    #[arg(long)]
    pub noise_floor: Option<u64>,

    /// Send the cropped changes to the description service.
    #[arg(long)]
    pub describe: bool,
}

/// Writes `addition.png` (boxes on the test image), `removal.png` (boxes on
/// the base image) and both binary masks to the output directory.
pub async fn run(ctx: &Context, args: &ImagesArgs) -> anyhow::Result<Comparison> {
    let detector = ctx.detector(args.noise_floor, DIRECTIONAL_NOISE_FLOOR);
    let (base, test) = detector.load_pair(&args.base, &args.test)?;

    let added = detector.find_additions(&base, &test)?;
    let removed = detector.find_removals(&base, &test)?;
    let mut comparison = detector.compare_masks(&added, &removed);

    let out = ctx.ensure_out_dir()?;
    save_gray(&added, &out.join("addition-mask.png"))?;
    save_gray(&removed, &out.join("removal-mask.png"))?;
    save_rgb(
        &detector.visualize_changes(&test, &comparison.additions.regions),
        &out.join("addition.png"),
    )?;
    save_rgb(
        &detector.visualize_changes(&base, &comparison.removals.regions),
        &out.join("removal.png"),
    )?;

    if args.describe {
        let crops = crop_changes(&[&test], &comparison.additions.regions)?;
        comparison.additions.description = ctx.describe(&crops).await?;
        let crops = crop_changes(&[&base], &comparison.removals.regions)?;
        comparison.removals.description = ctx.describe(&crops).await?;
    }

    Ok(comparison)
}
