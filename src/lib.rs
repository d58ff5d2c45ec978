//! hwinv library - hardware inventory with scannable QR device codes.
//!
//! This library exposes the core functionality of the `hwinv` CLI for use in
//! tests and other front ends.
//!
//! # Modules
//!
//! - `inventory`: SQLite-backed device records
//! - `identifier`: Device identifiers, QR rendering and the code image store
//! - `scanner`: QR decoding and frame-source scan sessions
//! - `controller`: User actions over storage, codes and scanning
//! - `config`: Settings file and data directory resolution
//! - `error`: Error types with user-recoverable hints
//! - `output`: Output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod identifier;
pub mod inventory;
pub mod logging;
pub mod output;
pub mod scanner;
