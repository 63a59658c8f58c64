//! Configuration system
//!
//! - [`Config`]: load/save any serde configuration as TOML or RON, chosen by
//!   file extension
//! - [`ViewerConfig`]: everything the viewer reads at startup
//! - [`TuningState`]: the runtime-tunable environment intensity

mod tuning;
mod viewer;

pub use tuning::{TuningState, BACKGROUND_BLURRINESS_RANGE, BACKGROUND_INTENSITY_RANGE, ENV_MAP_INTENSITY_RANGE};
pub use viewer::{
    AssetConfig, CameraConfig, ControlsConfig, EnvironmentSource, ModelConfig, SceneConfig,
    SkyboxConfig, TorusKnotConfig, ViewerConfig, WindowConfig,
};

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Parse configuration text in the given format
    fn from_str_as(contents: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Render configuration text in the given format
    fn to_string_as(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string())),
        }
    }

    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        Self::from_str_as(&contents, format)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = self.to_string_as(ConfigFormat::from_path(path)?)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::scratch_dir;

    #[test]
    fn test_format_follows_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("viewer.toml")).unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("viewer.ron")).unwrap(), ConfigFormat::Ron);
        assert!(ConfigFormat::from_path(Path::new("viewer")).is_err());
    }

    #[test]
    fn test_saved_config_loads_back() {
        let dir = scratch_dir("config_roundtrip");
        let config = ViewerConfig::hdr_profile();

        for name in ["viewer.toml", "viewer.ron"] {
            let path = dir.join(name);
            config.save_to_file(&path).unwrap();
            assert_eq!(ViewerConfig::load_from_file(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = ViewerConfig::load_from_file(scratch_dir("config_missing").join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
