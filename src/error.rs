//! Error types for board scanning and device selection.

use thiserror::Error;

/// Primary error type for scanner operations.
#[derive(Error, Debug)]
pub enum ScanError {
    // Selection errors
    #[error("No device matches {criterion}")]
    DeviceNotFound { criterion: String },

    #[error("Malformed device identifier '{input}': {reason}")]
    MalformedIdentifier { input: String, reason: &'static str },

    #[error("Device listing printed, no device selected")]
    ListingOnly,

    // Driver errors
    #[error("Local slot {slot} did not open")]
    SlotUnavailable { slot: u32 },

    #[error("Failed to open device '{locator}': {reason}")]
    DeviceOpenFailed { locator: String, reason: String },

    #[error("No device driver configured")]
    NoDriver,

    // Configuration errors
    #[error("Virtual device map unavailable at {path}: {reason}")]
    ConfigUnavailable { path: String, reason: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ScanError {
    pub fn malformed(input: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedIdentifier {
            input: input.into(),
            reason,
        }
    }

    /// Returns true if the error means "no device was selected".
    ///
    /// Malformed identifiers and the listing pseudo-command are treated
    /// the same as a criterion that matched nothing.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound { .. } | Self::MalformedIdentifier { .. } | Self::ListingOnly
        )
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound { .. }
                | Self::MalformedIdentifier { .. }
                | Self::ListingOnly
                | Self::NoDriver
                | Self::ConfigUnavailable { .. }
                | Self::ConfigInvalid(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::DeviceNotFound { .. } => Some("Run: bscan select LIST"),
            Self::MalformedIdentifier { .. } => {
                Some("Use an index, model name, serial number, 0x-serial or host:port")
            }
            Self::NoDriver => Some("Pass --bench <FILE> describing the attached boards"),
            Self::ConfigUnavailable { .. } => Some("Check --virtual-map or [virtual_devices].map_path"),
            Self::ConfigParse(_) | Self::ConfigInvalid(_) => {
                Some("Run: bscan config --path to find the settings file")
            }
            _ => None,
        }
    }
}

/// Convenience type alias for Results using ScanError.
pub type Result<T> = std::result::Result<T, ScanError>;

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
        self.map_err(|e| ScanError::Other(format!("{}: {e}", f().into())))
    }
}
