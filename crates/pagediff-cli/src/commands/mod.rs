//! Subcommand handlers. Each returns a serializable report; `main` prints it.

pub mod diff;
pub mod images;
pub mod page;
#[cfg(feature = "pdfium")]
pub mod pdf;
pub mod text;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use image::{GrayImage, RgbImage};
use pagediff::{prepare_content, ChangeDetector, CroppedRegion, DetectorConfig};

use crate::config::DescriberConfig;
use crate::describer::DescriptionClient;

const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Config file contents, if `--config` was given.
    pub detector_config: Option<DetectorConfig>,
    pub out_dir: PathBuf,
    pub describer: DescriberConfig,
}

impl Context {
    /// Build a detector. A `--noise-floor` flag beats the config file, which
    /// beats `default_floor`.
    pub fn detector(&self, noise_floor: Option<u64>, default_floor: u64) -> ChangeDetector {
        let mut config = self.detector_config.clone().unwrap_or_else(|| DetectorConfig {
            noise_floor: default_floor,
            ..DetectorConfig::default()
        });
        if let Some(floor) = noise_floor {
            config.noise_floor = floor;
        }
        ChangeDetector::new(config)
    }

    pub fn ensure_out_dir(&self) -> anyhow::Result<&Path> {
        std::fs::create_dir_all(&self.out_dir).with_context(|| {
            format!("Failed to create output directory {}", self.out_dir.display())
        })?;
        Ok(self.out_dir.as_path())
    }

    /// Ask the description service about `crops`. Returns `None` when there
    /// is nothing to describe.
    pub async fn describe(&self, crops: &[CroppedRegion]) -> anyhow::Result<Option<String>> {
        if crops.is_empty() {
            return Ok(None);
        }
        let client = DescriptionClient::new(self.describer.clone(), DESCRIBE_TIMEOUT)?;
        let content = prepare_content(client.prompt(), crops);
        tracing::info!("Describing {} cropped regions", crops.len());
        let text = client.describe(&content).await?;
        Ok(Some(text))
    }
}

pub(crate) fn save_rgb(image: &RgbImage, path: &Path) -> anyhow::Result<()> {
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

pub(crate) fn save_gray(image: &GrayImage, path: &Path) -> anyhow::Result<()> {
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(config: Option<DetectorConfig>) -> Context {
        Context {
            detector_config: config,
            out_dir: PathBuf::from("unused"),
            describer: DescriberConfig::default(),
        }
    }

    #[test]
    fn test_noise_floor_precedence() {
        let ctx = context(None);
        assert_eq!(ctx.detector(None, 49).config().noise_floor, 49);
        assert_eq!(ctx.detector(Some(7), 49).config().noise_floor, 7);

        let ctx = context(Some(DetectorConfig {
            noise_floor: 12,
            ..DetectorConfig::default()
        }));
        assert_eq!(ctx.detector(None, 49).config().noise_floor, 12);
        assert_eq!(ctx.detector(Some(3), 49).config().noise_floor, 3);
    }

    #[tokio::test]
    async fn test_describe_nothing_skips_service() {
        // No API key: this would fail if a request were attempted.
        let ctx = context(None);
        assert_eq!(ctx.describe(&[]).await.unwrap(), None);
    }
}
