//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/partita/`
//! - macOS: `~/Library/Application Support/partita/`
//! - Windows: `%APPDATA%\partita\`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "partita";

/// File name of the engine configuration.
pub const CONFIG_FILE_NAME: &str = "engine.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to `./partita` if the platform config directory is unknown.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path of the user's engine configuration file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}

/// Ensures the user configuration directory exists and returns it.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}
