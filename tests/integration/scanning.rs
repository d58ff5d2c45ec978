//! Scan sessions over real frame sources.

use std::fs;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use hwinv::error::InvError;
use hwinv::scanner::mock::{MockSource, SourceEvent};
use hwinv::scanner::{
    decode_all, decode_frame, FrameSource, ImageFileSource, ScanOptions, ScanOutcome,
    ScanSession, SnapshotDirSource,
};
use image::GrayImage;
use tempfile::TempDir;

use crate::common::fixtures::{blank_frame, code_frame, framed_code, write_frame};
use crate::common::init_test_logging;

fn quick() -> ScanOptions {
    ScanOptions {
        interval: Duration::from_millis(1),
        max_consecutive_failures: 5,
        timeout: Some(Duration::from_secs(5)),
    }
}

#[test]
fn test_code_inside_larger_frame() {
    init_test_logging();
    assert_eq!(
        decode_frame(&framed_code("SN1-Laptop")).as_deref(),
        Some("SN1-Laptop")
    );
}

#[test]
fn test_two_codes_in_one_frame() {
    let left = hwinv::identifier::encode("SN1-Laptop").unwrap();
    let right = hwinv::identifier::encode("SN2-Monitor").unwrap();
    let mut canvas = GrayImage::from_pixel(left.width() + right.width(), left.height(), image::Luma([255]));
    image::imageops::overlay(&mut canvas, &left, 0, 0);
    image::imageops::overlay(&mut canvas, &right, i64::from(left.width()), 0);

    let mut found = decode_all(&image::DynamicImage::ImageLuma8(canvas));
    found.sort();
    assert_eq!(found, vec!["SN1-Laptop", "SN2-Monitor"]);
}

#[test]
fn test_image_files_scanned_in_order() {
    init_test_logging();
    let temp = TempDir::new().unwrap();
    let paths = vec![
        write_frame(temp.path(), "0-empty.png", &blank_frame()),
        write_frame(temp.path(), "1-code.png", &framed_code("SN1-Laptop")),
        write_frame(temp.path(), "2-other.png", &code_frame("SN2-Monitor")),
    ];

    let source = ImageFileSource::open(paths).unwrap();
    let outcome = ScanSession::new(Box::new(source))
        .run(&quick(), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(outcome, ScanOutcome::Decoded("SN1-Laptop".to_string()));
}

#[test]
fn test_image_files_without_code_exhaust() {
    let temp = TempDir::new().unwrap();
    let paths = vec![write_frame(temp.path(), "a.png", &blank_frame())];

    let source = ImageFileSource::open(paths).unwrap();
    let outcome = ScanSession::new(Box::new(source))
        .run(&quick(), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(outcome, ScanOutcome::Exhausted);
}

#[test]
fn test_snapshot_dir_picks_up_existing_snapshot() {
    init_test_logging();
    let temp = TempDir::new().unwrap();
    write_frame(temp.path(), "snapshot.png", &framed_code("SN1-Laptop"));
    fs::write(temp.path().join("README.txt"), "not a frame").unwrap();

    let source = SnapshotDirSource::open(temp.path()).unwrap().include_existing();
    assert_eq!(source.describe(), temp.path().display().to_string());

    let outcome = ScanSession::new(Box::new(source))
        .run(&quick(), &AtomicBool::new(false))
        .unwrap();
    assert_eq!(outcome, ScanOutcome::Decoded("SN1-Laptop".to_string()));
}

#[test]
fn test_snapshot_dir_ignores_leftover_snapshot() {
    init_test_logging();
    let temp = TempDir::new().unwrap();
    write_frame(temp.path(), "snapshot.png", &framed_code("SN1-Laptop"));

    let source = SnapshotDirSource::open(temp.path()).unwrap();
    let options = ScanOptions {
        timeout: Some(Duration::from_millis(50)),
        ..quick()
    };
    let outcome = ScanSession::new(Box::new(source))
        .run(&options, &AtomicBool::new(false))
        .unwrap();
    assert_eq!(outcome, ScanOutcome::TimedOut);
}

#[test]
fn test_snapshot_dir_times_out_when_idle() {
    let temp = TempDir::new().unwrap();
    let source = SnapshotDirSource::open(temp.path()).unwrap();
    let options = ScanOptions {
        timeout: Some(Duration::from_millis(30)),
        ..quick()
    };

    let outcome = ScanSession::new(Box::new(source))
        .run(&options, &AtomicBool::new(false))
        .unwrap();
    assert_eq!(outcome, ScanOutcome::TimedOut);
}

#[test]
fn test_broken_camera_surfaces_unavailable_and_releases() {
    init_test_logging();
    let source = MockSource::new().repeating(SourceEvent::Failure);
    let log = source.log();

    let err = ScanSession::new(Box::new(source))
        .run(&quick(), &AtomicBool::new(false))
        .unwrap_err();

    assert!(matches!(err, InvError::CameraUnavailable { .. }));
    assert_eq!(log.reads(), 5);
    assert_eq!(log.releases(), 1);
}

#[test]
fn test_cancel_from_observer_stops_session() {
    use std::sync::atomic::Ordering;

    let source = MockSource::new().repeating(SourceEvent::Idle);
    let log = source.log();
    let cancel = AtomicBool::new(false);

    let outcome = ScanSession::new(Box::new(source))
        .run_with_progress(&quick(), &cancel, |tick| {
            if tick.tick == 3 {
                cancel.store(true, Ordering::SeqCst);
            }
        })
        .unwrap();

    assert_eq!(outcome, ScanOutcome::Cancelled);
    assert_eq!(log.reads(), 3);
    assert_eq!(log.releases(), 1);
}
