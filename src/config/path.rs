//! Path helpers for settings files and the data directory.
//!
//! Supports absolute paths, paths relative to the settings file, and "~" home
//! directory expansion.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{InvError, Result};

/// Application directory name under the platform data/config roots.
pub const APP_DIR_NAME: &str = "hwinv";

/// Resolve a path from a settings file.
///
/// Resolution rules:
/// 1. Absolute paths: used as-is
/// 2. Paths starting with `~`: expanded to home directory
/// 3. Relative paths: resolved relative to the settings file's directory
pub fn resolve_path(path: &Path, config_dir: &Path) -> Result<PathBuf> {
    trace!(
        path = %path.display(),
        config_dir = %config_dir.display(),
        "Resolving path"
    );

    let path_str = path.to_string_lossy();

    if path_str == "~" || path_str.starts_with("~/") {
        let home = home_dir()?;
        let rest = path_str.strip_prefix("~/").unwrap_or("");
        let resolved = if rest.is_empty() { home } else { home.join(rest) };
        debug!(
            original = %path.display(),
            resolved = %resolved.display(),
            "Expanded home directory path"
        );
        return Ok(resolved);
    }

    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    Ok(config_dir.join(path))
}

/// Resolve the user's home directory (cross-platform).
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| InvError::ConfigParse("Could not determine home directory".to_string()))
}

/// Per-user data directory holding the database and code images.
///
/// Location: `~/.local/share/hwinv` (platform equivalent elsewhere)
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir().ok_or_else(|| {
        InvError::Other("Could not determine local data directory".to_string())
    })?;
    Ok(data_dir.join(APP_DIR_NAME))
}

/// Per-user settings directory.
///
/// Location: `~/.config/hwinv` (platform equivalent elsewhere)
pub fn default_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| InvError::Other("Could not determine config directory".to_string()))?;
    Ok(config_dir.join(APP_DIR_NAME))
}
