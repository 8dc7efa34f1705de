//! Configuration types supplied by the embedding application.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::api::commands::CHANNEL_NAME;

/// Configuration of a [`SurfaceTexturePlugin`](crate::SurfaceTexturePlugin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Name of the method channel the plugin answers on.
    pub channel_name: String,
    /// Logging setup used by [`SurfaceTexturePlugin::with_logging`](crate::SurfaceTexturePlugin::with_logging).
    pub logger: LoggerConfig,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            channel_name: CHANNEL_NAME.to_string(),
            logger: LoggerConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Filter directive used when `RUST_LOG` is not set (default: `info`)
    pub default_level: String,
    /// Directory for daily-rolling log files; console only when `None`
    pub log_directory: Option<PathBuf>,
    /// File name prefix of the rolling log files
    pub log_file_prefix: String,
    /// Colorize console output
    pub with_ansi: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            log_directory: None,
            log_file_prefix: "map_surface_texture.log".to_string(),
            with_ansi: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: PluginConfig =
            serde_json::from_str(r#"{ "logger": { "default_level": "debug" } }"#)
                .expect("valid config");

        assert_eq!(config.channel_name, CHANNEL_NAME);
        assert_eq!(config.logger.default_level, "debug");
        assert_eq!(config.logger.log_directory, None);
        assert_eq!(config.logger.log_file_prefix, "map_surface_texture.log");
    }
}
