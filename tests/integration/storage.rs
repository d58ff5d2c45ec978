//! Persistence tests for the device table.

use hwinv::error::InvError;
use hwinv::inventory::{Device, InventoryDb, DB_FILE_NAME};
use tempfile::TempDir;

use crate::common::init_test_logging;

fn devices() -> Vec<Device> {
    vec![
        Device::new("Laptop", "SN1", "2024-01-01", "Office"),
        Device::new("Monitor", "MON-7", "2023-06-15", "Office"),
        Device::new("Router", "RT_100%", "2022-02-02", "Server room"),
    ]
}

#[test]
fn test_rows_survive_reopen() {
    init_test_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join(DB_FILE_NAME);

    {
        let db = InventoryDb::open(&path).unwrap();
        for device in devices() {
            db.insert(&device).unwrap();
        }
    }

    let db = InventoryDb::open(&path).unwrap();
    assert_eq!(db.count().unwrap(), 3);
    assert_eq!(db.list(None).unwrap(), devices());
    assert_eq!(db.path(), Some(path.as_path()));
}

#[test]
fn test_duplicate_serial_keeps_first_row() {
    init_test_logging();
    let db = InventoryDb::in_memory().unwrap();
    db.insert(&Device::new("Laptop", "SN1", "2024-01-01", "Office")).unwrap();

    let err = db
        .insert(&Device::new("Tablet", "SN1", "2024-02-02", "Lab"))
        .unwrap_err();
    match err {
        InvError::DuplicateKey { field, value } => {
            assert_eq!(field, "serial");
            assert_eq!(value, "SN1");
        }
        other => panic!("Expected DuplicateKey, got {other:?}"),
    }

    let rows = db.list(None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Laptop");
}

#[test]
fn test_search_matches_name_or_serial_only() {
    init_test_logging();
    let db = InventoryDb::in_memory().unwrap();
    for device in devices() {
        db.insert(&device).unwrap();
    }

    let names = |filter: &str| -> Vec<String> {
        db.list(Some(filter))
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect()
    };

    assert_eq!(names("lap"), vec!["Laptop"]);
    assert_eq!(names("mon-"), vec!["Monitor"]);
    // Location is not searched
    assert!(names("Office").is_empty());
    // Wildcards are literal
    assert_eq!(names("%"), vec!["Router"]);
    assert!(names("SN_").is_empty());
    assert_eq!(names("").len(), 3);
    assert_eq!(names("   ").len(), 3);
}

#[test]
fn test_update_then_lookup_by_new_identifier() {
    init_test_logging();
    let db = InventoryDb::in_memory().unwrap();
    db.insert(&Device::new("Laptop", "SN1", "2024-01-01", "Office")).unwrap();

    let moved = Device::new("Laptop Pro", "SN1", "2024-01-01", "Home");
    db.update("SN1", &moved).unwrap();

    assert_eq!(db.find_by_identifier("SN1-Laptop Pro").unwrap(), moved);
    assert!(matches!(
        db.find_by_identifier("SN1-Laptop"),
        Err(InvError::NotFound { .. })
    ));
}

#[test]
fn test_delete_is_idempotent() {
    init_test_logging();
    let db = InventoryDb::in_memory().unwrap();
    db.insert(&Device::new("Laptop", "SN1", "2024-01-01", "Office")).unwrap();

    assert!(db.delete("SN1").unwrap());
    assert!(!db.delete("SN1").unwrap());
    assert_eq!(db.count().unwrap(), 0);
}
