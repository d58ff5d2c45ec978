//! Device storage.
//!
//! A single SQLite table holds every device record:
//!
//! ```text
//! ~/.local/share/hwinv/
//! ├── inventory.db      # devices(name, serial UNIQUE, purchase_date, location, identifier UNIQUE)
//! └── qrcodes/          # one PNG per identifier
//!     └── SN1-Laptop.png
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use hwinv::inventory::{Device, InventoryDb};
//!
//! let db = InventoryDb::open_default()?;
//! db.insert(&Device::new("Laptop", "SN1", "2024-01-01", "Office"))?;
//! let device = db.find_by_identifier("SN1-Laptop")?;
//! ```

mod db;
mod schema;

pub use db::{default_db_path, InventoryDb, DB_FILE_NAME};
pub use schema::{Device, DeviceForm};
