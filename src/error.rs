//! Error types for inventory operations.

use thiserror::Error;

/// Primary error type for inventory operations.
#[derive(Error, Debug)]
pub enum InvError {
    // Input errors
    #[error("Missing required field(s): {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("A device with {field} '{value}' already exists")]
    DuplicateKey { field: String, value: String },

    #[error("No matching device for {what}")]
    NotFound { what: String },

    // Scanning errors
    #[error("Camera unavailable: {reason}")]
    CameraUnavailable { reason: String },

    #[error("Frame source has no more frames")]
    SourceExhausted,

    // Code and image errors
    #[error("QR encoding failed: {0}")]
    CodeEncoding(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Image file not found: {path}")]
    ImageNotFound { path: String },

    // Storage errors
    #[error("Database error: {0}")]
    Database(String),

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl InvError {
    /// Builds a `NotFound` for a serial number lookup.
    pub fn serial_not_found(serial: &str) -> Self {
        Self::NotFound {
            what: format!("serial '{serial}'"),
        }
    }

    /// Builds a `NotFound` for a scanned identifier lookup.
    pub fn identifier_not_found(identifier: &str) -> Self {
        Self::NotFound {
            what: format!("identifier '{identifier}'"),
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::DuplicateKey { .. }
                | Self::NotFound { .. }
                | Self::CameraUnavailable { .. }
                | Self::SourceExhausted
                | Self::ImageNotFound { .. }
                | Self::ConfigNotFound { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Validation { .. } => {
                Some("Provide --name, --serial, --purchase-date and --location (none may be blank)")
            }
            Self::DuplicateKey { .. } => Some("Choose a different serial number or device name"),
            Self::NotFound { .. } => Some("Run: hwinv list"),
            Self::CameraUnavailable { .. } => {
                Some("Check that the capture source exists and is producing image files")
            }
            Self::ConfigNotFound { .. } => Some("Check the --config path or remove the flag"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using InvError.
pub type Result<T> = std::result::Result<T, InvError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| InvError::Other(format!("{}: {e}", f().into())))
    }
}
