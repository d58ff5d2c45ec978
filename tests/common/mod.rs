//! Common test utilities for the hwinv CLI and library.
//!
//! - `cli`: CLI runner bound to a throwaway data directory
//! - `fixtures`: Temporary inventories and QR frame images
#![allow(dead_code)]

pub mod cli;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
