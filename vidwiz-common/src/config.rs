//! Vidwiz Configuration Parser
//!
//! Parses the optional `config.toml`. Every field has a default, so a
//! missing file or an empty one yields a working configuration.

use crate::error::ConfigError;
use crate::transition::SpringConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VidwizConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Transcoding engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// ffmpeg executable, looked up on PATH when not absolute
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Scratch name the fetched bytes are written under
    #[serde(default = "default_input_name")]
    pub input_name: String,

    /// Scratch name of the transcoded output; its extension picks the format
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            input_name: default_input_name(),
            output_name: default_output_name(),
        }
    }
}

/// Remote fetch settings
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds (0 disables it)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Window and animation settings
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_width")]
    pub width: i32,

    #[serde(default = "default_height")]
    pub height: i32,

    #[serde(default = "default_spring_stiffness")]
    pub spring_stiffness: f64,

    #[serde(default = "default_spring_damping")]
    pub spring_damping: f64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            spring_stiffness: default_spring_stiffness(),
            spring_damping: default_spring_damping(),
        }
    }
}

impl UiConfig {
    pub fn spring(&self) -> SpringConfig {
        SpringConfig {
            stiffness: self.spring_stiffness,
            damping: self.spring_damping,
            ..SpringConfig::default()
        }
    }
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_input_name() -> String {
    "input.webm".to_string()
}

fn default_output_name() -> String {
    "output.mp4".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("vidwiz/{}", env!("CARGO_PKG_VERSION"))
}

fn default_width() -> i32 {
    720
}

fn default_height() -> i32 {
    520
}

fn default_spring_stiffness() -> f64 {
    SpringConfig::default().stiffness
}

fn default_spring_damping() -> f64 {
    SpringConfig::default().damping
}

impl FromStr for VidwizConfig {
    type Err = ConfigError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(contents)?)
    }
}

impl VidwizConfig {
    /// Load configuration from a file path
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        contents.parse()
    }

    /// Load from `path` if given, else from the user config file if it
    /// exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match crate::paths::config_file() {
            Some(default_path) if default_path.exists() => {
                tracing::info!("Loading config from {}", default_path.display());
                Self::from_file(&default_path)
            }
            _ => Ok(Self::default()),
        }
    }
}
