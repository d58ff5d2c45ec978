//! Device identifiers and their QR code images.
//!
//! A device's identifier is `serial-name`. It is the payload of the device's
//! QR code and the key used to find the device again after a scan.

mod store;

pub use store::{default_code_dir, CodeStore, CODE_DIR_NAME};

use std::io::Cursor;

use base64::Engine;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use tracing::{debug, instrument};

use crate::error::{InvError, Result};

/// Pixel size of one QR module unless configured otherwise.
pub const DEFAULT_MODULE_SIZE: u32 = 10;

/// Largest accepted module size. Bounds the rendered image to a few megapixels
/// even for the biggest QR version.
pub const MAX_MODULE_SIZE: u32 = 64;

/// Derive the public identifier for a device.
///
/// The `-` delimiter is not escaped; uniqueness is enforced by storage.
pub fn compute_identifier(serial: &str, name: &str) -> String {
    format!("{serial}-{name}")
}

/// QR rendering parameters.
///
/// Error correction is always level L and the quiet zone is always the
/// standard four modules; only the module size varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeStyle {
    pub module_size: u32,
}

impl Default for CodeStyle {
    fn default() -> Self {
        Self {
            module_size: DEFAULT_MODULE_SIZE,
        }
    }
}

/// Render an identifier as a QR code image with the default style.
pub fn encode(identifier: &str) -> Result<GrayImage> {
    encode_with(identifier, CodeStyle::default())
}

/// Render an identifier as a QR code image.
#[instrument(skip(style), fields(module_size = style.module_size))]
pub fn encode_with(identifier: &str, style: CodeStyle) -> Result<GrayImage> {
    let module = style.module_size;
    if !(1..=MAX_MODULE_SIZE).contains(&module) {
        return Err(InvError::CodeEncoding(format!(
            "module size {module} is outside 1..={MAX_MODULE_SIZE}"
        )));
    }

    let code = QrCode::with_error_correction_level(identifier.as_bytes(), EcLevel::L)
        .map_err(|e| InvError::CodeEncoding(e.to_string()))?;

    let image = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(module, module)
        .build();

    debug!(
        width = image.width(),
        height = image.height(),
        modules = code.width(),
        "QR code rendered"
    );
    Ok(image)
}

/// Encode a rendered code as PNG bytes.
pub fn to_png_bytes(image: &GrayImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| InvError::ImageProcessing(format!("Failed to encode PNG: {e}")))?;
    Ok(bytes)
}

/// Render an identifier straight to base64-encoded PNG (robot mode output).
pub fn encode_png_base64(identifier: &str, style: CodeStyle) -> Result<String> {
    let image = encode_with(identifier, style)?;
    let bytes = to_png_bytes(&image)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}
