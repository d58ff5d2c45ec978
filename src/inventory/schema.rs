//! Device record types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identifier::compute_identifier;

/// A stored hardware device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Human-readable device name (e.g. "Laptop").
    pub name: String,
    /// Serial number; unique across the inventory.
    pub serial: String,
    /// Purchase date, expected as `YYYY-MM-DD`.
    pub purchase_date: String,
    /// Where the device lives.
    pub location: String,
    /// `serial-name`, the QR payload and scan lookup key.
    pub identifier: String,
}

impl Device {
    /// Build a device, deriving its identifier from serial and name.
    #[must_use]
    pub fn new(name: &str, serial: &str, purchase_date: &str, location: &str) -> Self {
        Self {
            name: name.to_string(),
            serial: serial.to_string(),
            purchase_date: purchase_date.to_string(),
            location: location.to_string(),
            identifier: compute_identifier(serial, name),
        }
    }

    /// True if `purchase_date` parses as a `YYYY-MM-DD` calendar date.
    pub fn has_valid_purchase_date(&self) -> bool {
        NaiveDate::parse_from_str(&self.purchase_date, "%Y-%m-%d").is_ok()
    }
}

/// The four user-entered fields, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceForm {
    pub name: String,
    pub serial: String,
    pub purchase_date: String,
    pub location: String,
}

impl DeviceForm {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        serial: impl Into<String>,
        purchase_date: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            serial: serial.into(),
            purchase_date: purchase_date.into(),
            location: location.into(),
        }
    }

    /// Names of fields that are empty after trimming, in form order.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("name", &self.name),
            ("serial", &self.serial),
            ("purchase_date", &self.purchase_date),
            ("location", &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field.to_string())
        .collect()
    }

    /// Convert to a device with trimmed fields and a derived identifier.
    #[must_use]
    pub fn to_device(&self) -> Device {
        Device::new(
            self.name.trim(),
            self.serial.trim(),
            self.purchase_date.trim(),
            self.location.trim(),
        )
    }
}

impl From<&Device> for DeviceForm {
    fn from(device: &Device) -> Self {
        Self::new(
            device.name.clone(),
            device.serial.clone(),
            device.purchase_date.clone(),
            device.location.clone(),
        )
    }
}
