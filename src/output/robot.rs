//! Robot mode JSON output implementation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::Settings;
use crate::controller::{DeleteReport, InventoryStatus, SavedDevice, ScanReport};
use crate::error::InvError;
use crate::inventory::Device;

use super::{Output, RobotFormat, VersionInfo};

/// JSON output implementation for AI agents and scripting.
///
/// Results go to stdout, errors to stderr.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> String {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        rendered.unwrap_or_else(|e| {
            serde_json::json!({ "error": true, "message": format!("serialization failed: {e}") })
                .to_string()
        })
    }

    /// Output any serializable data as JSON to stdout.
    #[instrument(skip(self, data), fields(format = ?self.format))]
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        let json = self.render(data);
        trace!(json_len = json.len(), "JSON serialized");
        println!("{json}");
    }
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        debug!(message, "Robot: success");
        self.output_json(&serde_json::json!({
            "success": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &InvError) {
        debug!(error = %error, "Robot: error");
        let mut body = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        if let InvError::Validation { missing } = error {
            body["missing"] = serde_json::json!(missing);
        }
        eprintln!("{}", self.render(&body));
    }

    fn warning(&self, message: &str) {
        debug!(message, "Robot: warning");
        self.output_json(&serde_json::json!({
            "warning": true,
            "message": message
        }));
    }

    fn info(&self, message: &str) {
        debug!(message, "Robot: info");
        self.output_json(&serde_json::json!({
            "info": true,
            "message": message
        }));
    }

    #[instrument(skip(self, saved), fields(serial = %saved.device.serial))]
    fn device_saved(&self, saved: &SavedDevice, edited: bool) {
        debug!("Robot: device_saved");
        self.output_json(&serde_json::json!({
            "ok": true,
            "action": if edited { "edited" } else { "added" },
            "device": saved.device,
            "code_path": saved.code_path,
            "warnings": saved.warnings,
            "previous_identifier": saved.previous_identifier,
        }));
    }

    fn device_deleted(&self, report: &DeleteReport) {
        debug!(serial = %report.serial, "Robot: device_deleted");
        self.output_json(report);
    }

    #[instrument(skip(self, devices), fields(count = devices.len()))]
    fn device_list(&self, devices: &[Device], filter: Option<&str>) {
        debug!("Robot: device_list");
        self.output_json(&serde_json::json!({
            "filter": filter,
            "count": devices.len(),
            "devices": devices,
        }));
    }

    fn device_detail(&self, device: &Device, code_path: Option<&Path>) {
        debug!(serial = %device.serial, "Robot: device_detail");
        self.output_json(&serde_json::json!({
            "device": device,
            "code_path": code_path,
        }));
    }

    fn code_generated(&self, device: &Device, path: &Path, png_base64: Option<&str>) {
        debug!(identifier = %device.identifier, "Robot: code_generated");
        let mut body = serde_json::json!({
            "identifier": device.identifier,
            "code_path": path,
        });
        if let Some(data) = png_base64 {
            body["png_base64"] = serde_json::json!(data);
        }
        self.output_json(&body);
    }

    fn scan_report(&self, report: &ScanReport) {
        debug!(outcome = ?report.outcome, "Robot: scan_report");
        self.output_json(report);
    }

    fn status(&self, status: &InventoryStatus, settings: &Settings) {
        debug!("Robot: status");
        self.output_json(&serde_json::json!({
            "database": status.database,
            "code_dir": status.code_dir,
            "devices": status.devices,
            "missing_codes": status.missing_codes,
            "config_file": settings.source,
            "scan": settings.scan,
            "codes": settings.codes,
        }));
    }

    fn version_info(&self, info: &VersionInfo) {
        debug!(version = info.version, "Robot: version_info");
        self.output_json(info);
    }
}
