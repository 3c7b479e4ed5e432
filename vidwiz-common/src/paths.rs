//! Centralized Path Definitions

use std::path::PathBuf;

/// Directory name used under the XDG base directories
pub const APP_DIR: &str = "vidwiz";

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// User config directory (~/.config/vidwiz)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Default config file (~/.config/vidwiz/config.toml)
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Parent directory for engine scratch space and converted media.
///
/// Falls back to the system temp dir when there is no user cache dir.
pub fn scratch_root() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join(APP_DIR))
        .unwrap_or_else(std::env::temp_dir)
}
