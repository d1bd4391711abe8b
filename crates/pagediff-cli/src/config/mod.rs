//! Configuration loading and resolution.
//!
//! Everything is resolved once in `main` and handed to the commands; nothing
//! here is read lazily.

use std::path::{Path, PathBuf};

use anyhow::Context;
use pagediff::DetectorConfig;

/// Noise floor used by the addition/removal command when no config file is given.
pub const DIRECTIONAL_NOISE_FLOOR: u64 = 49;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_PROMPT: &str = "These images are cropped regions of a document. \
    The first half come from the original version and the second half from the \
    modified version, in the same order. Describe what changed in each region.";

/// Resolve the output directory.
pub fn resolve_output_dir(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var("PAGEDIFF_OUT") {
        return PathBuf::from(env_path);
    }

    PathBuf::from("pagediff-out")
}

/// Load a detector config from a JSON file. Missing fields take defaults.
pub fn load_detector_config(path: &Path) -> anyhow::Result<DetectorConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::debug!("Loaded detector config from {}", path.display());
    Ok(config)
}

/// Settings for the change-description service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriberConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
}

impl Default for DescriberConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl DescriberConfig {
    /// Resolve each setting: explicit value, then environment, then default.
    pub fn resolve(model: Option<String>, prompt: Option<String>) -> Self {
        Self::resolve_with(model, prompt, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        model: Option<String>,
        prompt: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            api_key: env("PAGEDIFF_API_KEY").filter(|k| !k.is_empty()),
            api_base: env("PAGEDIFF_API_BASE").unwrap_or(defaults.api_base),
            model: model
                .or_else(|| env("PAGEDIFF_MODEL"))
                .unwrap_or(defaults.model),
            prompt: prompt
                .or_else(|| env("PAGEDIFF_PROMPT"))
                .unwrap_or(defaults.prompt),
            max_tokens: defaults.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_explicit_output_dir_wins() {
        assert_eq!(resolve_output_dir(Some("/tmp/x")), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_describer_resolution_order() {
        let env: HashMap<&str, &str> = [
            ("PAGEDIFF_API_KEY", "sk-test"),
            ("PAGEDIFF_MODEL", "env-model"),
            ("PAGEDIFF_API_BASE", "http://localhost:9999/v1"),
        ]
        .into_iter()
        .collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let config = DescriberConfig::resolve_with(Some("cli-model".into()), None, lookup);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "cli-model");
        assert_eq!(config.api_base, "http://localhost:9999/v1");
        assert_eq!(config.prompt, DEFAULT_PROMPT);

        let config = DescriberConfig::resolve_with(None, None, lookup);
        assert_eq!(config.model, "env-model");
    }

    #[test]
    fn test_empty_api_key_is_missing() {
        let config = DescriberConfig::resolve_with(None, None, |k| {
            (k == "PAGEDIFF_API_KEY").then(String::new)
        });
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_load_detector_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "noise_floor": 10, "box_thickness": 5 }"#).unwrap();
        let config = load_detector_config(&path).unwrap();
        assert_eq!(config.noise_floor, 10);
        assert_eq!(config.box_thickness, 5);
        assert_eq!(config.high_pixel, 255);

        std::fs::write(&path, "not json").unwrap();
        assert!(load_detector_config(&path).is_err());
    }
}
