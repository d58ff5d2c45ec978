//! Settings and per-user paths.
//!
//! Precedence for every value: CLI flag, then environment variable (through
//! clap), then the settings file, then built-in defaults.

mod path;
mod settings;

pub use path::{default_config_dir, default_data_dir, home_dir, resolve_path, APP_DIR_NAME};
pub use settings::{CodeSettings, ConfigFormat, ScanSettings, Settings};
