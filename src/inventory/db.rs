//! SQLite storage for device records.
//!
//! Every statement auto-commits; there are no multi-statement transactions.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info, instrument, trace};

use super::schema::Device;
use crate::config::default_data_dir;
use crate::error::{InvError, Result};

/// File name of the inventory database inside the data directory.
pub const DB_FILE_NAME: &str = "inventory.db";

/// SQLite schema for the inventory.
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS devices (
    name TEXT NOT NULL,
    serial TEXT NOT NULL UNIQUE,
    purchase_date TEXT,
    location TEXT,
    identifier TEXT UNIQUE
);
";

const SELECT_COLUMNS: &str = "SELECT name, serial, purchase_date, location, identifier FROM devices";

/// Database handle for the device table.
///
/// Opened once per process and handed to whoever needs it.
pub struct InventoryDb {
    conn: Connection,
    path: Option<PathBuf>,
}

impl InventoryDb {
    /// Opens or creates the database at the standard location.
    ///
    /// Location: `~/.local/share/hwinv/inventory.db`
    #[instrument]
    pub fn open_default() -> Result<Self> {
        let path = default_db_path()?;
        Self::open(&path)
    }

    /// Opens or creates a database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InvError::Database(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        debug!(path = %path.display(), "Opening inventory database");
        let conn = Connection::open(path)
            .map_err(|e| InvError::Database(format!("Failed to open database: {e}")))?;

        let db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.init()?;
        info!(path = %path.display(), "Inventory database ready");
        Ok(db)
    }

    /// Creates an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            InvError::Database(format!("Failed to create in-memory database: {e}"))
        })?;

        let db = Self { conn, path: None };
        db.init()?;
        Ok(db)
    }

    /// Path of the backing file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Ensures the device table exists. Safe to call repeatedly.
    pub fn init(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(|e| InvError::Database(format!("Failed to initialize schema: {e}")))
    }

    /// Inserts a new device.
    ///
    /// Fails with `DuplicateKey` if the serial or identifier already exists.
    #[instrument(skip(self, device), fields(serial = %device.serial))]
    pub fn insert(&self, device: &Device) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO devices (name, serial, purchase_date, location, identifier)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    device.name,
                    device.serial,
                    device.purchase_date,
                    device.location,
                    device.identifier,
                ],
            )
            .map_err(|e| map_write_error(e, device, "insert device"))?;

        info!(serial = %device.serial, identifier = %device.identifier, "Device inserted");
        Ok(())
    }

    /// Replaces the row whose serial is `old_serial` with `device`.
    ///
    /// Fails with `NotFound` when no row has `old_serial`, and with
    /// `DuplicateKey` when the new serial or identifier belongs to another row.
    #[instrument(skip(self, device), fields(new_serial = %device.serial))]
    pub fn update(&self, old_serial: &str, device: &Device) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE devices SET
                    name = ?1,
                    serial = ?2,
                    purchase_date = ?3,
                    location = ?4,
                    identifier = ?5
                 WHERE serial = ?6",
                params![
                    device.name,
                    device.serial,
                    device.purchase_date,
                    device.location,
                    device.identifier,
                    old_serial,
                ],
            )
            .map_err(|e| map_write_error(e, device, "update device"))?;

        if changed == 0 {
            debug!(old_serial, "No device to update");
            return Err(InvError::serial_not_found(old_serial));
        }

        info!(old_serial, serial = %device.serial, "Device updated");
        Ok(())
    }

    /// Deletes a device by serial.
    ///
    /// Returns true if a row was deleted, false if none matched.
    #[instrument(skip(self))]
    pub fn delete(&self, serial: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM devices WHERE serial = ?1", params![serial])
            .map_err(|e| InvError::Database(format!("Failed to delete device: {e}")))?;

        if deleted > 0 {
            info!(serial, "Device deleted");
            Ok(true)
        } else {
            debug!(serial, "Device not found for deletion");
            Ok(false)
        }
    }

    /// Lists devices, optionally filtered by a substring of name or serial.
    ///
    /// The filter is trimmed; an empty filter returns every device. `%`, `_`
    /// and `\` in the filter match literally. Matching is ASCII
    /// case-insensitive (SQLite `LIKE`). Rows come back in storage order.
    #[instrument(skip(self))]
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<Device>> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());

        let devices = match filter {
            Some(text) => {
                let pattern = format!("%{}%", escape_like(text));
                trace!(pattern = %pattern, "Filtering devices");
                let mut stmt = self
                    .conn
                    .prepare(&format!(
                        r"{SELECT_COLUMNS} WHERE name LIKE ?1 ESCAPE '\' OR serial LIKE ?1 ESCAPE '\'"
                    ))
                    .map_err(|e| InvError::Database(format!("Failed to prepare statement: {e}")))?;
                stmt.query_map(params![pattern], device_from_row)
                    .map_err(|e| InvError::Database(format!("Failed to query devices: {e}")))?
                    .collect::<std::result::Result<Vec<_>, _>>()
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(SELECT_COLUMNS)
                    .map_err(|e| InvError::Database(format!("Failed to prepare statement: {e}")))?;
                stmt.query_map([], device_from_row)
                    .map_err(|e| InvError::Database(format!("Failed to query devices: {e}")))?
                    .collect::<std::result::Result<Vec<_>, _>>()
            }
        }
        .map_err(|e| InvError::Database(format!("Failed to collect devices: {e}")))?;

        debug!(count = devices.len(), filtered = filter.is_some(), "Listed devices");
        Ok(devices)
    }

    /// Finds the device carrying a scanned identifier.
    #[instrument(skip(self))]
    pub fn find_by_identifier(&self, identifier: &str) -> Result<Device> {
        self.find_one("identifier", identifier)?
            .ok_or_else(|| InvError::identifier_not_found(identifier))
    }

    /// Finds a device by serial number.
    #[instrument(skip(self))]
    pub fn find_by_serial(&self, serial: &str) -> Result<Device> {
        self.find_one("serial", serial)?
            .ok_or_else(|| InvError::serial_not_found(serial))
    }

    /// Number of stored devices.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))
            .map_err(|e| InvError::Database(format!("Failed to count devices: {e}")))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn find_one(&self, column: &'static str, value: &str) -> Result<Option<Device>> {
        self.conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE {column} = ?1"),
                params![value],
                device_from_row,
            )
            .optional()
            .map_err(|e| InvError::Database(format!("Failed to look up device by {column}: {e}")))
    }
}

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<Device> {
    Ok(Device {
        name: row.get(0)?,
        serial: row.get(1)?,
        purchase_date: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        location: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        identifier: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

/// Turns UNIQUE violations into `DuplicateKey`; everything else is a database error.
fn map_write_error(e: rusqlite::Error, device: &Device, action: &str) -> InvError {
    if let rusqlite::Error::SqliteFailure(err, Some(message)) = &e {
        if err.code == ErrorCode::ConstraintViolation && message.starts_with("UNIQUE") {
            let (field, value) = if message.contains("devices.identifier") {
                ("identifier", &device.identifier)
            } else {
                ("serial", &device.serial)
            };
            debug!(field, value = %value, "Unique constraint violated");
            return InvError::DuplicateKey {
                field: field.to_string(),
                value: value.clone(),
            };
        }
    }
    InvError::Database(format!("Failed to {action}: {e}"))
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Returns the default database path.
///
/// Location: `~/.local/share/hwinv/inventory.db`
pub fn default_db_path() -> Result<PathBuf> {
    Ok(default_data_dir()?.join(DB_FILE_NAME))
}
