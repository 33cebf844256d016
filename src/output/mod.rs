//! Output mode abstraction for robot and human output.

use std::path::Path;

use serde::Serialize;

use crate::cli::Cli;
use crate::config::ScannerConfig;
use crate::device::DeviceSnapshot;
use crate::diff::DeviceListDiff;
use crate::error::ScanError;
use crate::registry::ScanReport;

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

// === Command Result Types ===

/// Result of `list`.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceListing {
    pub report: ScanReport,
    pub devices: Vec<DeviceSnapshot>,
    /// Rendered enumeration table.
    #[serde(skip)]
    pub table: String,
}

/// A board opened by `select`, `find` or `info`.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    /// Argument or criterion that picked the board.
    pub criterion: String,
    /// Name that selects the same board again.
    pub ref_name: String,
    pub description: String,
    pub index: u32,
    pub remote: bool,
}

/// One `watch` iteration.
#[derive(Debug, Clone, Serialize)]
pub struct WatchEvent {
    pub scan: u64,
    pub report: ScanReport,
    pub diff: DeviceListDiff,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { color: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human {
                color: !cli.no_color,
            }
        }
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { color } => Box::new(HumanOutput::new(color)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn error(&self, error: &ScanError);
    fn warning(&self, message: &str);

    // Discovery
    fn device_list(&self, listing: &DeviceListing, long: bool);
    fn device_selected(&self, selection: &Selection);
    fn device_info(&self, selection: &Selection, snapshot: Option<&DeviceSnapshot>);
    fn watch_event(&self, event: &WatchEvent);

    // Configuration
    fn config_info(&self, path: Option<&Path>, config: &ScannerConfig);

    // Metadata
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>);
}
