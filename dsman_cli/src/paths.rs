//! Centralized path management for the dsman CLI
//!
//! User-level configuration follows the XDG Base Directory specification on
//! Unix-like systems. Dataset-level configuration lives inside each dataset
//! (see [`dsman_core::dataset::dataset_config_path`]).

use std::path::PathBuf;

/// The name of the application directory used across all platforms
const APP_DIR: &str = "dsman";

/// The name of the user configuration file
const CONFIG_FILE: &str = "config.toml";

/// Returns the path to the user configuration directory
///
/// - `$XDG_CONFIG_HOME/dsman` when `XDG_CONFIG_HOME` is set (not on Windows)
/// - `~/.config/dsman` on Linux
/// - `~/Library/Application Support/dsman` on macOS
/// - `%APPDATA%\dsman` on Windows
///
/// Falls back to `.dsman` in the current directory.
pub fn get_config_dir() -> PathBuf {
    #[cfg(not(target_os = "windows"))]
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join(APP_DIR);
    }

    #[cfg(target_os = "linux")]
    {
        dirs::home_dir()
            .map(|home| home.join(".config").join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(".dsman"))
    }

    #[cfg(not(target_os = "linux"))]
    {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(".dsman"))
    }
}

/// Returns the path to the user configuration file
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}
