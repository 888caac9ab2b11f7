use crate::error::{Result, SprintError};
use crate::richtext::RenderSize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
pub const DEFAULT_FALLBACK_TEXT: &str = "This note could not be displayed.";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Configuration for sprint, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SprintConfig {
    /// Body shown in place of a note whose stored markup cannot be decoded
    #[serde(default = "default_fallback_text")]
    pub fallback_text: String,

    /// Default log level when neither `--verbose` nor `RUST_LOG` is given
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Size images are inserted at
    #[serde(default = "default_image_width")]
    pub image_width: u32,

    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

fn default_fallback_text() -> String {
    DEFAULT_FALLBACK_TEXT.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_image_width() -> u32 {
    RenderSize::default().width
}

fn default_image_height() -> u32 {
    RenderSize::default().height
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            fallback_text: default_fallback_text(),
            log_level: default_log_level(),
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

impl SprintConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(SprintError::Io)?;
        let config: SprintConfig =
            serde_json::from_str(&content).map_err(SprintError::Serialization)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(SprintError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(SprintError::Serialization)?;
        fs::write(config_path, content).map_err(SprintError::Io)?;
        Ok(())
    }

    pub fn image_size(&self) -> RenderSize {
        RenderSize {
            width: self.image_width,
            height: self.image_height,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(SprintError::Config(format!(
                "image size must be non-zero, got {}x{}",
                self.image_width, self.image_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SprintConfig::default();
        assert_eq!(config.fallback_text, DEFAULT_FALLBACK_TEXT);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.image_size(), RenderSize::default());
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = SprintConfig::load(temp_dir.path().join("absent")).unwrap();
        assert_eq!(config, SprintConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("nested");

        let config = SprintConfig {
            fallback_text: "unavailable".to_string(),
            image_width: 200,
            ..SprintConfig::default()
        };
        config.save(&dir).unwrap();

        let loaded = SprintConfig::load(&dir).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            r#"{"log_level": "debug"}"#,
        )
        .unwrap();

        let loaded = SprintConfig::load(temp_dir.path()).unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.fallback_text, DEFAULT_FALLBACK_TEXT);
    }

    #[test]
    fn test_zero_image_size_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            r#"{"image_width": 0}"#,
        )
        .unwrap();

        assert!(matches!(
            SprintConfig::load(temp_dir.path()),
            Err(SprintError::Config(_))
        ));
    }
}
