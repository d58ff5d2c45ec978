//! Human-friendly terminal output.

use std::path::Path;

use colored::Colorize;
use tracing::{debug, instrument, trace};

use crate::config::Settings;
use crate::controller::{DeleteReport, InventoryStatus, SavedDevice, ScanReport};
use crate::error::InvError;
use crate::inventory::Device;
use crate::scanner::ScanOutcome;

use super::{Output, VersionInfo};

const COLUMNS: [&str; 4] = ["Name", "Serial", "Purchase date", "Location"];

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    quiet: bool,
}

impl HumanOutput {
    #[instrument]
    pub fn new(quiet: bool) -> Self {
        debug!("Creating HumanOutput");
        Self { quiet }
    }

    fn field(label: &str, value: impl std::fmt::Display) {
        println!("  {}{value}", format!("{:<15}", format!("{label}:")).dimmed());
    }

    fn device_fields(device: &Device) {
        Self::field("Name", &device.name);
        Self::field("Serial", &device.serial);
        Self::field("Purchase date", &device.purchase_date);
        Self::field("Location", &device.location);
        Self::field("Identifier", device.identifier.cyan());
    }
}

/// Pad every column to its widest cell.
fn table_rows(devices: &[Device]) -> Vec<String> {
    let cells: Vec<[&str; 4]> = devices
        .iter()
        .map(|d| {
            [
                d.name.as_str(),
                d.serial.as_str(),
                d.purchase_date.as_str(),
                d.location.as_str(),
            ]
        })
        .collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |row: [&str; 4]| {
        row.iter()
            .zip(widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(cell.chars().count());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    std::iter::once(format_row(COLUMNS))
        .chain(cells.into_iter().map(format_row))
        .collect()
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", "[OK]".green().bold());
    }

    #[instrument(skip(self))]
    fn error(&self, error: &InvError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!("{} {}", "Error:".red().bold(), error.to_string().bold());
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{} {}", "Hint:".yellow(), suggestion.dimmed());
        }
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {message}", "[WARN]".yellow().bold());
    }

    fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", "[INFO]".blue().bold());
    }

    #[instrument(skip(self, saved), fields(serial = %saved.device.serial))]
    fn device_saved(&self, saved: &SavedDevice, edited: bool) {
        for warning in &saved.warnings {
            self.warning(warning);
        }
        let verb = if edited { "Updated" } else { "Saved" };
        self.success(&format!("{verb} {}", saved.device.identifier.cyan()));
        if let Some(previous) = &saved.previous_identifier {
            self.info(&format!("Identifier changed from {previous}"));
        }
        if !self.quiet {
            Self::field("QR code", saved.code_path.display());
        }
    }

    fn device_deleted(&self, report: &DeleteReport) {
        if report.deleted {
            self.success(&format!("Deleted device {}", report.serial));
        } else {
            self.warning(&format!("No device with serial '{}'", report.serial));
        }
    }

    #[instrument(skip(self, devices), fields(device_count = devices.len()))]
    fn device_list(&self, devices: &[Device], filter: Option<&str>) {
        if devices.is_empty() {
            trace!("No devices - showing info");
            match filter {
                Some(f) if !f.trim().is_empty() => {
                    self.info(&format!("No devices match '{}'", f.trim()));
                }
                _ => self.info("No devices stored yet. Run: hwinv add --help"),
            }
            return;
        }

        let mut rows = table_rows(devices).into_iter();
        if let Some(header) = rows.next() {
            println!("{}", header.bold());
        }
        for row in rows {
            println!("{row}");
        }
        if !self.quiet {
            println!("{}", format!("{} device(s)", devices.len()).dimmed());
        }
    }

    fn device_detail(&self, device: &Device, code_path: Option<&Path>) {
        println!("{}", device.name.bold());
        Self::device_fields(device);
        match code_path {
            Some(path) => Self::field("QR code", path.display()),
            None => Self::field("QR code", "missing (run: hwinv code <SERIAL>)".yellow()),
        }
    }

    fn code_generated(&self, device: &Device, path: &Path, png_base64: Option<&str>) {
        if let Some(data) = png_base64 {
            // Raw payload only, so the output can be piped.
            println!("{data}");
            return;
        }
        self.success(&format!(
            "QR code for {} written to {}",
            device.identifier.cyan(),
            path.display()
        ));
    }

    fn scan_report(&self, report: &ScanReport) {
        match (&report.outcome, &report.device) {
            (ScanOutcome::Decoded(_), Some(device)) => {
                println!("{} {}", "Found:".green().bold(), device.name.bold());
                Self::device_fields(device);
            }
            (ScanOutcome::Decoded(text), None) => {
                self.warning(&format!("Decoded '{text}' but no device matches"));
            }
            (ScanOutcome::Cancelled, _) => self.info("Scan cancelled"),
            (ScanOutcome::TimedOut, _) => self.warning("Scan timed out before a code was found"),
            (ScanOutcome::Exhausted, _) => self.warning("No QR code found"),
        }
    }

    fn status(&self, status: &InventoryStatus, settings: &Settings) {
        println!("{}", "hwinv status".bold());
        match &status.database {
            Some(path) => Self::field("Database", path.display()),
            None => Self::field("Database", "in-memory"),
        }
        Self::field("QR codes", status.code_dir.display());
        match &settings.source {
            Some(path) => Self::field("Config", path.display()),
            None => Self::field("Config", "defaults".dimmed()),
        }
        Self::field("Devices", status.devices);
        if status.missing_codes > 0 {
            Self::field(
                "Missing codes",
                status.missing_codes.to_string().yellow(),
            );
        }
        Self::field(
            "Scan",
            format!(
                "every {}ms, give up after {} failed reads",
                settings.scan.interval_ms, settings.scan.max_consecutive_failures
            ),
        );
    }

    fn version_info(&self, info: &VersionInfo) {
        let dirty = if info.git_dirty { " (dirty)" } else { "" };
        println!("{} {}", "hwinv".bold(), info.version.green());
        Self::field("Git SHA", format!("{}{}", info.git_sha, dirty.yellow()));
        Self::field("Built", info.build_timestamp.dimmed());
        Self::field("Rust", info.rustc_version.dimmed());
        Self::field("Target", info.target.dimmed());
    }
}
