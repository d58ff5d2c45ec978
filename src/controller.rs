//! Command handlers tying storage, code generation and scanning together.
//!
//! Every user action is one method call on [`Inventory`]. Input is validated
//! before any storage operation; a rejected form changes nothing.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{InvError, Result};
use crate::identifier::{encode_with, CodeStore, CodeStyle, CODE_DIR_NAME};
use crate::inventory::{Device, DeviceForm, InventoryDb, DB_FILE_NAME};
use crate::scanner::{ScanOptions, ScanOutcome, ScanSession, ScanTick};

/// A device as stored after save or edit.
#[derive(Debug, Clone, Serialize)]
pub struct SavedDevice {
    pub device: Device,
    /// Where its QR code image was written.
    pub code_path: PathBuf,
    /// Non-fatal remarks about the input.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Identifier before an edit, when the edit changed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_identifier: Option<String>,
}

/// Result of a delete request.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub serial: String,
    /// False if no device had that serial.
    pub deleted: bool,
    /// True if a code image was removed alongside the row.
    pub code_removed: bool,
}

/// Result of a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    /// Present when a code was decoded and matched a device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
}

/// Where things live and how much is stored.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    pub code_dir: PathBuf,
    pub devices: usize,
    /// Devices whose code image is missing on disk.
    pub missing_codes: usize,
}

/// Check the four user-entered fields.
///
/// Fails with `Validation` naming every field that is blank after trimming.
/// A purchase date that is present but not `YYYY-MM-DD` only produces a
/// warning.
pub fn validate_form(form: &DeviceForm) -> Result<(Device, Vec<String>)> {
    let missing = form.missing_fields();
    if !missing.is_empty() {
        debug!(?missing, "Form rejected");
        return Err(InvError::Validation { missing });
    }

    let device = form.to_device();
    let mut warnings = Vec::new();
    if !device.has_valid_purchase_date() {
        warnings.push(format!(
            "Purchase date '{}' is not in YYYY-MM-DD format",
            device.purchase_date
        ));
    }
    Ok((device, warnings))
}

/// The inventory: one storage handle plus the code image store.
pub struct Inventory {
    db: InventoryDb,
    codes: CodeStore,
}

impl Inventory {
    pub const fn new(db: InventoryDb, codes: CodeStore) -> Self {
        Self { db, codes }
    }

    /// Open (or create) the inventory in a data directory.
    ///
    /// Layout: `<dir>/inventory.db` and `<dir>/qrcodes/`.
    pub fn open_in(data_dir: &Path, code_style: CodeStyle) -> Result<Self> {
        let db = InventoryDb::open(data_dir.join(DB_FILE_NAME))?;
        let codes = CodeStore::new(data_dir.join(CODE_DIR_NAME)).with_style(code_style);
        Ok(Self::new(db, codes))
    }

    pub const fn db(&self) -> &InventoryDb {
        &self.db
    }

    pub const fn codes(&self) -> &CodeStore {
        &self.codes
    }

    /// Store a new device and generate its code image.
    #[instrument(skip(self, form), fields(serial = %form.serial.trim()))]
    pub fn save(&self, form: &DeviceForm) -> Result<SavedDevice> {
        let (device, warnings) = validate_form(form)?;
        for warning in &warnings {
            warn!("{warning}");
        }

        // Render first: a payload the encoder rejects must not leave a row behind.
        let image = encode_with(&device.identifier, self.codes.style())?;
        self.db.insert(&device)?;
        let code_path = match self.codes.persist(&device.identifier, &image) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Code image not written, removing row");
                self.db.delete(&device.serial)?;
                return Err(e);
            }
        };

        info!(identifier = %device.identifier, "Device saved");
        Ok(SavedDevice {
            device,
            code_path,
            warnings,
            previous_identifier: None,
        })
    }

    /// Replace the device stored under `old_serial`.
    ///
    /// The identifier is recomputed and its code image regenerated. When the
    /// identifier changed, the image of the old identifier is deleted. If the
    /// new code cannot be rendered or written, the stored row is left as it was.
    #[instrument(skip(self, form))]
    pub fn edit(&self, old_serial: &str, form: &DeviceForm) -> Result<SavedDevice> {
        let (device, warnings) = validate_form(form)?;
        let old_serial = old_serial.trim();

        let previous = self.db.find_by_serial(old_serial)?;
        let image = encode_with(&device.identifier, self.codes.style())?;
        self.db.update(old_serial, &device)?;
        let code_path = match self.codes.persist(&device.identifier, &image) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Code image not written, restoring previous row");
                self.db.update(&device.serial, &previous)?;
                return Err(e);
            }
        };

        let previous_identifier = if previous.identifier == device.identifier {
            None
        } else {
            if self.codes.path_for(&previous.identifier) != code_path {
                self.codes.remove(&previous.identifier)?;
            }
            Some(previous.identifier)
        };

        info!(identifier = %device.identifier, "Device edited");
        Ok(SavedDevice {
            device,
            code_path,
            warnings,
            previous_identifier,
        })
    }

    /// Delete a device and its code image. Unknown serials are a no-op.
    #[instrument(skip(self))]
    pub fn delete(&self, serial: &str) -> Result<DeleteReport> {
        let serial = serial.trim();
        let identifier = match self.db.find_by_serial(serial) {
            Ok(device) => Some(device.identifier),
            Err(InvError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        let deleted = self.db.delete(serial)?;
        let code_removed = match identifier {
            Some(identifier) if deleted => self.codes.remove(&identifier)?,
            _ => false,
        };

        Ok(DeleteReport {
            serial: serial.to_string(),
            deleted,
            code_removed,
        })
    }

    /// All devices, or those whose name or serial contains `filter`.
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<Device>> {
        self.db.list(filter)
    }

    /// One device by serial.
    pub fn show(&self, serial: &str) -> Result<Device> {
        self.db.find_by_serial(serial.trim())
    }

    /// Look up the device behind a decoded code.
    #[instrument(skip(self))]
    pub fn lookup_scanned(&self, text: &str) -> Result<Device> {
        self.db.find_by_identifier(text)
    }

    /// Re-render the code image for a stored device.
    pub fn regenerate(&self, serial: &str) -> Result<(Device, PathBuf)> {
        let device = self.show(serial)?;
        let path = self.codes.generate(&device.identifier)?;
        Ok((device, path))
    }

    /// Run a scan session and resolve whatever it decodes.
    ///
    /// A decoded code that matches no device is a `NotFound` error.
    pub fn scan<F>(
        &self,
        session: ScanSession,
        options: &ScanOptions,
        cancel: &AtomicBool,
        observer: F,
    ) -> Result<ScanReport>
    where
        F: FnMut(ScanTick),
    {
        let outcome = session.run_with_progress(options, cancel, observer)?;
        let device = match &outcome {
            ScanOutcome::Decoded(text) => Some(self.lookup_scanned(text)?),
            _ => None,
        };
        Ok(ScanReport { outcome, device })
    }

    /// Storage locations and counts.
    pub fn status(&self) -> Result<InventoryStatus> {
        let devices = self.db.list(None)?;
        let missing_codes = devices
            .iter()
            .filter(|d| !self.codes.exists(&d.identifier))
            .count();
        Ok(InventoryStatus {
            database: self.db.path().map(Path::to_path_buf),
            code_dir: self.codes.dir().to_path_buf(),
            devices: devices.len(),
            missing_codes,
        })
    }
}
