//! Output mode abstraction for robot and human output.

use std::path::Path;

use crate::cli::Cli;
use crate::config::Settings;
use crate::controller::{DeleteReport, InventoryStatus, SavedDevice, ScanReport};
use crate::error::InvError;
use crate::inventory::Device;

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// JSON output for AI agents and scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { quiet: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human { quiet: cli.quiet }
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { quiet } => Box::new(HumanOutput::new(quiet)),
        }
    }
}

/// Build metadata shown by `hwinv version`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_sha: &'static str,
    pub git_dirty: bool,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
    pub target: &'static str,
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &InvError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Device records
    fn device_saved(&self, saved: &SavedDevice, edited: bool);
    fn device_deleted(&self, report: &DeleteReport);
    fn device_list(&self, devices: &[Device], filter: Option<&str>);
    fn device_detail(&self, device: &Device, code_path: Option<&Path>);

    // Codes and scanning
    fn code_generated(&self, device: &Device, path: &Path, png_base64: Option<&str>);
    fn scan_report(&self, report: &ScanReport);

    // Metadata
    fn status(&self, status: &InventoryStatus, settings: &Settings);
    fn version_info(&self, info: &VersionInfo);
}
