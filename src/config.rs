//! Application configuration file
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! [camera]
//! target = "video"
//! resolution = [640, 480]
//! fps = 30
//! capture_port = 0
//! video_source = "/srv/camfeed/loop.mjpeg"
//! min_quality = 30
//!
//! [server]
//! stream_addr = "0.0.0.0:8000"
//! http_addr = "0.0.0.0:8080"
//! prompt_user = "porch"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::device::DeviceConfig;
use crate::error::ConfigError;
use crate::server::ServerConfig;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Capture device settings
    pub camera: DeviceConfig,
    /// Network settings
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&contents, path)
    }

    /// Load from a TOML file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CaptureMode;
    use std::io::Write;

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [camera]
            target = "camera"
            fps = 12

            [server]
            prompt_user = "porch"
            "#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();

        assert_eq!(config.camera.target, CaptureMode::Camera);
        assert_eq!(config.camera.fps, 12);
        assert_eq!(config.camera.min_quality, 30);
        assert_eq!(config.server.prompt_user, "porch");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_or_default(Path::new("/nonexistent/camfeed.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camera]\nfps = \"fast\"").unwrap();

        let result = AppConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
