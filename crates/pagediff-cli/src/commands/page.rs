//! One page pair of a multi-page comparison.

use std::path::Path;

use image::RgbImage;
use pagediff::raster::page_file_name;
use pagediff::{crop_changes, ChangeDetector, ChangeSet, Comparison};
use serde::Serialize;

use super::{save_rgb, Context};

/// Changes found on one page (1-based).
#[derive(Debug, Serialize)]
pub struct PageReport {
    pub page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PageOptions {
    /// Addition/removal passes instead of the symmetric one.
    pub directional: bool,
    pub describe: bool,
}

/// Compare one page pair and write its overlays into `overlay_dir`.
pub async fn compare_page(
    ctx: &Context,
    detector: &ChangeDetector,
    page: usize,
    base: &RgbImage,
    test: &RgbImage,
    overlay_dir: &Path,
    options: PageOptions,
) -> anyhow::Result<PageReport> {
    let file_name = page_file_name(page.saturating_sub(1));
    let mut report = PageReport {
        page,
        changes: None,
        comparison: None,
    };

    if options.directional {
        let mut comparison = detector.compare(base, test)?;
        save_rgb(
            &detector.visualize_changes(test, &comparison.additions.regions),
            &overlay_dir.join(format!("addition-{file_name}")),
        )?;
        save_rgb(
            &detector.visualize_changes(base, &comparison.removals.regions),
            &overlay_dir.join(format!("removal-{file_name}")),
        )?;
        if options.describe {
            let crops = crop_changes(&[test], &comparison.additions.regions)?;
            comparison.additions.description = ctx.describe(&crops).await?;
            let crops = crop_changes(&[base], &comparison.removals.regions)?;
            comparison.removals.description = ctx.describe(&crops).await?;
        }
        report.comparison = Some(comparison);
    } else {
        let mut changes = detector.compare_generic(base, test)?;
        save_rgb(
            &detector.visualize_changes(test, &changes.regions),
            &overlay_dir.join(&file_name),
        )?;
        if options.describe {
            let crops = detector.crop_changes(base, test, &changes.regions)?;
            changes.description = ctx.describe(&crops).await?;
        }
        report.changes = Some(changes);
    }

    tracing::debug!("Compared page {page}");
    Ok(report)
}
