//! User settings loaded from a TOML or YAML file.
//!
//! # Example TOML
//!
//! ```toml
//! data_dir = "~/inventory"
//!
//! [scan]
//! interval_ms = 30
//! max_consecutive_failures = 100
//! timeout_secs = 0
//!
//! [codes]
//! module_size = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use super::path::{default_config_dir, default_data_dir, resolve_path};
use crate::error::{InvError, Result, ResultExt};
use crate::identifier::{CodeStyle, DEFAULT_MODULE_SIZE, MAX_MODULE_SIZE};
use crate::scanner::ScanOptions;

/// Settings file names looked up in the config directory, in order.
const SETTINGS_FILE_NAMES: [&str; 3] = ["config.toml", "config.yaml", "config.yml"];

/// Settings file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml).
    Yaml,
    /// TOML format (.toml).
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Scan loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    /// Milliseconds between frame pulls.
    pub interval_ms: u64,
    /// Consecutive frame read failures tolerated before giving up.
    pub max_consecutive_failures: u32,
    /// Seconds before a scan gives up (0 = never).
    pub timeout_secs: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            interval_ms: 30,
            max_consecutive_failures: 100,
            timeout_secs: 0,
        }
    }
}

impl ScanSettings {
    pub fn to_options(&self) -> ScanOptions {
        ScanOptions {
            interval: Duration::from_millis(self.interval_ms),
            max_consecutive_failures: self.max_consecutive_failures.max(1),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        }
    }
}

/// QR rendering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodeSettings {
    /// Pixel size of one QR module.
    pub module_size: u32,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            module_size: DEFAULT_MODULE_SIZE,
        }
    }
}

impl CodeSettings {
    /// Reject module sizes the renderer would refuse or could not allocate.
    pub fn validate(&self) -> Result<()> {
        if (1..=MAX_MODULE_SIZE).contains(&self.module_size) {
            Ok(())
        } else {
            Err(InvError::ConfigParse(format!(
                "codes.module_size must be between 1 and {MAX_MODULE_SIZE}, got {}",
                self.module_size
            )))
        }
    }

    pub const fn to_style(&self) -> CodeStyle {
        CodeStyle {
            module_size: self.module_size,
        }
    }
}

/// Everything configurable from the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory for the database and code images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub scan: ScanSettings,
    pub codes: CodeSettings,
    /// File the settings came from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Parse settings text in the given format.
    ///
    /// Values that parse but are out of range fail with `ConfigParse`.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        trace!(?format, len = content.len(), "Parsing settings");
        let settings: Self = match format {
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| InvError::ConfigParse(e.to_string()))?
            }
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| InvError::ConfigParse(e.to_string()))?
            }
        };
        settings.codes.validate()?;
        Ok(settings)
    }

    /// Load settings from an explicit file.
    ///
    /// A relative or `~` `data_dir` is resolved against the file's directory.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(InvError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            InvError::ConfigParse(format!(
                "Unsupported settings file extension: {} (use .toml, .yaml or .yml)",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut settings = Self::parse(&content, format)?;

        if let Some(data_dir) = settings.data_dir.take() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            settings.data_dir = Some(resolve_path(&data_dir, base)?);
        }
        settings.source = Some(path.to_path_buf());

        info!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Load from `--config` if given, else the first settings file found in
    /// the config directory, else built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let Ok(config_dir) = default_config_dir() else {
            debug!("No config directory on this platform, using defaults");
            return Ok(Self::default());
        };

        Self::discover(&config_dir)
    }

    /// Load the first settings file present in `config_dir`, or defaults.
    pub fn discover(config_dir: &Path) -> Result<Self> {
        for name in SETTINGS_FILE_NAMES {
            let candidate = config_dir.join(name);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
        }
        debug!(config_dir = %config_dir.display(), "No settings file found, using defaults");
        Ok(Self::default())
    }

    /// Effective data directory: override, then settings, then platform default.
    pub fn data_dir(&self, override_dir: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = override_dir {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        default_data_dir()
    }
}
