//! QR generation and code store tests.

use hwinv::identifier::{encode, encode_png_base64, to_png_bytes, CodeStore, CodeStyle};
use hwinv::scanner::decode_frame;
use image::DynamicImage;
use regex::Regex;
use tempfile::TempDir;

use crate::common::init_test_logging;

#[test]
fn test_generated_file_decodes_to_identifier() {
    init_test_logging();
    let temp = TempDir::new().unwrap();
    let store = CodeStore::new(temp.path().join("qrcodes"));

    let path = store.generate("SN1-Laptop").unwrap();
    assert_eq!(path, temp.path().join("qrcodes").join("SN1-Laptop.png"));

    let frame = image::open(&path).unwrap();
    assert_eq!(decode_frame(&frame).as_deref(), Some("SN1-Laptop"));
}

#[test]
fn test_default_style_dimensions() {
    // Version 1 is 21 modules plus a 4-module quiet zone on each side
    let image = encode("SN1-Laptop").unwrap();
    assert_eq!(image.width(), (21 + 8) * 10);
    assert_eq!(image.width(), image.height());

    let small = hwinv::identifier::encode_with("SN1-Laptop", CodeStyle { module_size: 2 }).unwrap();
    assert_eq!(small.width(), (21 + 8) * 2);
}

#[test]
fn test_long_identifier_grows_symbol() {
    let long = format!("SERIAL-{}", "x".repeat(120));
    let image = encode(&long).unwrap();
    assert!(image.width() > (21 + 8) * 10);
    assert_eq!(
        decode_frame(&DynamicImage::ImageLuma8(image)).as_deref(),
        Some(long.as_str())
    );
}

#[test]
fn test_unsafe_identifier_gets_hashed_name_inside_store() {
    init_test_logging();
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("qrcodes");
    let store = CodeStore::new(&dir);

    let pattern = Regex::new(r"^[A-Za-z0-9._-]*-[0-9a-f]{12}\.png$").unwrap();
    for identifier in ["../../etc-passwd", "SN 42/B-Drucker", "..", "A:B-C"] {
        let path = store.generate(identifier).unwrap();
        assert_eq!(path.parent(), Some(dir.as_path()), "{identifier} escaped");

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(pattern.is_match(&file_name), "unexpected name {file_name}");
        assert!(!file_name.starts_with('.'));

        let frame = image::open(&path).unwrap();
        assert_eq!(decode_frame(&frame).as_deref(), Some(identifier));
    }
}

#[test]
fn test_distinct_identifiers_never_share_a_file() {
    let store = CodeStore::new("/tmp/unused");
    assert_ne!(store.path_for("SN 1-A"), store.path_for("SN/1-A"));
    assert_ne!(store.path_for("SN_1-A"), store.path_for("SN 1-A"));
}

#[test]
fn test_remove_reports_presence() {
    let temp = TempDir::new().unwrap();
    let store = CodeStore::new(temp.path());
    store.generate("SN1-Laptop").unwrap();

    assert!(store.exists("SN1-Laptop"));
    assert!(store.remove("SN1-Laptop").unwrap());
    assert!(!store.remove("SN1-Laptop").unwrap());
    assert!(!store.exists("SN1-Laptop"));
}

#[test]
fn test_base64_matches_png_bytes() {
    use base64::Engine;

    let style = CodeStyle { module_size: 3 };
    let encoded = encode_png_base64("SN1-Laptop", style).unwrap();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();

    let expected = to_png_bytes(&hwinv::identifier::encode_with("SN1-Laptop", style).unwrap()).unwrap();
    assert_eq!(bytes, expected);
    assert_eq!(&bytes[1..4], b"PNG");
}
