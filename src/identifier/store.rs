//! On-disk store of rendered QR code images, one PNG per identifier.

use std::fs;
use std::path::{Path, PathBuf};

use image::GrayImage;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, trace};

use super::{encode_with, CodeStyle};
use crate::config::default_data_dir;
use crate::error::{InvError, Result};

/// Name of the code directory inside the data directory.
pub const CODE_DIR_NAME: &str = "qrcodes";

/// Hex digits of the identifier hash appended to sanitised filenames.
const HASH_SUFFIX_LEN: usize = 12;

/// Directory of QR code images keyed by identifier.
#[derive(Debug, Clone)]
pub struct CodeStore {
    dir: PathBuf,
    style: CodeStyle,
}

impl CodeStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            style: CodeStyle::default(),
        }
    }

    /// Creates a store at the standard location.
    ///
    /// Location: `~/.local/share/hwinv/qrcodes/`
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(default_code_dir()?))
    }

    /// Use a custom rendering style for generated codes.
    #[must_use]
    pub fn with_style(mut self, style: CodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn style(&self) -> CodeStyle {
        self.style
    }

    /// Image path for an identifier.
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{}.png", file_stem(identifier)))
    }

    /// Whether an image exists for the identifier.
    pub fn exists(&self, identifier: &str) -> bool {
        self.path_for(identifier).is_file()
    }

    /// Render and persist the code for an identifier.
    pub fn generate(&self, identifier: &str) -> Result<PathBuf> {
        let image = encode_with(identifier, self.style)?;
        self.persist(identifier, &image)
    }

    /// Write an already rendered image, replacing any existing file.
    #[instrument(skip(self, image), fields(dir = %self.dir.display()))]
    pub fn persist(&self, identifier: &str, image: &GrayImage) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            InvError::ImageProcessing(format!(
                "Failed to create code directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let path = self.path_for(identifier);
        image
            .save(&path)
            .map_err(|e| InvError::ImageProcessing(format!("Failed to write {}: {e}", path.display())))?;

        info!(path = %path.display(), "QR code written");
        Ok(path)
    }

    /// Delete the image for an identifier.
    ///
    /// Returns true if a file was removed.
    #[instrument(skip(self))]
    pub fn remove(&self, identifier: &str) -> Result<bool> {
        let path = self.path_for(identifier);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "QR code removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %path.display(), "No QR code to remove");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Filename stem for an identifier.
///
/// Identifiers made only of ASCII letters, digits, `.`, `_` and `-` (and not
/// starting with `.`) are used verbatim. Anything else has each unsafe
/// character replaced by `_` and a short SHA-256 prefix of the full identifier
/// appended, so the file always stays inside the code directory and two
/// identifiers never share a file.
pub fn file_stem(identifier: &str) -> String {
    if is_safe_stem(identifier) {
        return identifier.to_string();
    }

    let sanitized: String = identifier
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect();
    let digest = hex::encode(Sha256::digest(identifier.as_bytes()));
    let stem = format!("{}-{}", sanitized.trim_start_matches('.'), &digest[..HASH_SUFFIX_LEN]);
    trace!(identifier, stem = %stem, "Sanitized code filename");
    stem
}

fn is_safe_stem(identifier: &str) -> bool {
    !identifier.is_empty() && !identifier.starts_with('.') && identifier.chars().all(is_safe_char)
}

const fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Returns the default code directory.
///
/// Location: `~/.local/share/hwinv/qrcodes/`
pub fn default_code_dir() -> Result<PathBuf> {
    Ok(default_data_dir()?.join(CODE_DIR_NAME))
}
