use crate::error::{Error, Result};
use crate::field::cell_count;
use crate::patterns::Pattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Settings for the engine and viewer, exported and imported as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Pause between generations in milliseconds (0 = unthrottled)
    pub interval_ms: u64,
    /// Pattern seeded at start-up
    pub pattern: Pattern,
    /// Grid cells per braille dot in the viewer (1 = full resolution)
    pub zoom: u16,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            width: 300,
            height: 300,
            interval_ms: 5,
            pattern: Pattern::default(),
            zoom: 1,
        }
    }
}

impl LifeConfig {
    /// Check the values an engine cannot be built from
    pub fn validate(&self) -> Result<()> {
        cell_count(self.width, self.height)?;
        if self.zoom == 0 {
            return Err(Error::Config("zoom must be at least 1".into()));
        }
        Ok(())
    }

    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("spectral-life").join("config.json"))
    }

    /// Load the default config file if there is a usable one
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = LifeConfig {
            version: 1,
            width: 128,
            height: 96,
            interval_ms: 0,
            pattern: Pattern::Acorn,
            zoom: 3,
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: LifeConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_file_save_and_load() {
        let config = LifeConfig::default();

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to_file(&path).unwrap();
        let loaded = LifeConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.width, 300);
        assert_eq!(loaded.pattern, Pattern::RPentomino);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        LifeConfig::default().save_to_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: LifeConfig = serde_json::from_str(r#"{ "width": 64 }"#).unwrap();
        assert_eq!(parsed.width, 64);
        assert_eq!(parsed.height, 300);
        assert_eq!(parsed.interval_ms, 5);
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), r#"{ "width": 0, "height": 10 }"#).unwrap();

        let result = LifeConfig::load_from_file(temp_file.path());
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_zero_zoom_rejected() {
        let config = LifeConfig {
            zoom: 0,
            ..LifeConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not valid json").unwrap();

        let result = LifeConfig::load_from_file(temp_file.path());
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let result = LifeConfig::load_from_file(Path::new("/nonexistent/path/config.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
