//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::inventory::{Device, DeviceForm};

/// hwinv - Hardware inventory with scannable QR device codes.
///
/// Robot Mode: Use --robot or --format json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "hwinv", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "HWINV_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (repeat for more: -v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Directory holding inventory.db and qrcodes/
    #[arg(long, global = true, env = "HWINV_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Settings file (default: <config dir>/hwinv/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Records ===
    /// Add a device and generate its QR code
    Add(AddArgs),

    /// Change a stored device (fields not given keep their value)
    Edit(EditArgs),

    /// Delete a device and its QR code
    Delete(DeleteArgs),

    /// List devices, optionally filtered by name or serial
    #[command(visible_alias = "search")]
    List(ListArgs),

    /// Show one device
    Show(ShowArgs),

    // === Codes ===
    /// Scan image frames for a QR code and show the matching device
    Scan(ScanArgs),

    /// Regenerate a device's QR code image
    Code(CodeArgs),

    /// Look up a device by its identifier (serial-name)
    Lookup(LookupArgs),

    // === Utilities ===
    /// Show storage locations and counts
    Status,

    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Device name
    #[arg(long, short = 'n', default_value = "")]
    pub name: String,

    /// Serial number (unique)
    #[arg(long, short = 's', default_value = "")]
    pub serial: String,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long, short = 'd', default_value = "")]
    pub purchase_date: String,

    /// Where the device is kept
    #[arg(long, short = 'l', default_value = "")]
    pub location: String,
}

impl AddArgs {
    pub fn to_form(&self) -> DeviceForm {
        DeviceForm::new(
            self.name.as_str(),
            self.serial.as_str(),
            self.purchase_date.as_str(),
            self.location.as_str(),
        )
    }
}

#[derive(Parser, Debug)]
pub struct EditArgs {
    /// Serial the device is currently stored under
    pub old_serial: String,

    /// New device name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New serial number
    #[arg(long, short = 's')]
    pub serial: Option<String>,

    /// New purchase date (YYYY-MM-DD)
    #[arg(long, short = 'd')]
    pub purchase_date: Option<String>,

    /// New location
    #[arg(long, short = 'l')]
    pub location: Option<String>,
}

impl EditArgs {
    /// Form pre-filled from `current`, overridden by the given flags.
    pub fn to_form(&self, current: &Device) -> DeviceForm {
        let mut form = DeviceForm::from(current);
        if let Some(name) = &self.name {
            form.name.clone_from(name);
        }
        if let Some(serial) = &self.serial {
            form.serial.clone_from(serial);
        }
        if let Some(date) = &self.purchase_date {
            form.purchase_date.clone_from(date);
        }
        if let Some(location) = &self.location {
            form.location.clone_from(location);
        }
        form
    }
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Serial of the device to delete
    pub serial: String,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Case-insensitive substring of name or serial
    pub filter: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Serial of the device
    pub serial: String,
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Image files to scan, in order
    #[arg(required_unless_present = "watch_dir", conflicts_with = "watch_dir")]
    pub images: Vec<PathBuf>,

    /// Watch a directory a capture tool writes snapshots into.
    /// Only snapshots written after the scan starts are read.
    #[arg(long, value_name = "DIR")]
    pub watch_dir: Option<PathBuf>,

    /// With --watch-dir, also read the newest snapshot already present
    #[arg(long, requires = "watch_dir")]
    pub include_existing: bool,

    /// Milliseconds between frame reads (default from settings: 30)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Give up after this many seconds (0 = never)
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,

    /// Consecutive failed reads before giving up
    #[arg(long)]
    pub max_failures: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct CodeArgs {
    /// Serial of the device
    pub serial: String,

    /// Also print the PNG as base64 (robot mode: in the JSON)
    #[arg(long)]
    pub base64: bool,
}

#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Identifier as encoded in the QR code
    pub identifier: String,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
