//! Robot mode JSON output implementation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::config::ScannerConfig;
use crate::device::DeviceSnapshot;
use crate::error::ScanError;

use super::{DeviceListing, Output, RobotFormat, Selection, WatchEvent};

/// JSON output implementation for scripting.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        match rendered {
            Ok(json) => {
                trace!(json_len = json.len(), "JSON serialized");
                Some(json)
            }
            Err(e) => {
                warn!(error = %e, "JSON serialization failed");
                None
            }
        }
    }

    /// Output any serializable data as JSON to stdout.
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            println!("{json}");
        }
    }

    /// Output single-line JSON (for streaming events).
    fn output_json_line<T: Serialize>(&self, data: &T) {
        match serde_json::to_string(data) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "JSON serialization failed"),
        }
    }
}

impl Output for RobotOutput {
    #[instrument(skip(self))]
    fn error(&self, error: &ScanError) {
        debug!(error = %error, "Robot: error");
        let body = serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "not_found": error.is_not_found(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        if let Some(json) = self.render(&body) {
            eprintln!("{json}");
        }
    }

    fn warning(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "warning": true,
            "message": message
        }));
    }

    #[instrument(skip(self, listing), fields(count = listing.devices.len()))]
    fn device_list(&self, listing: &DeviceListing, _long: bool) {
        self.output_json(listing);
    }

    fn device_selected(&self, selection: &Selection) {
        self.output_json(selection);
    }

    fn device_info(&self, selection: &Selection, snapshot: Option<&DeviceSnapshot>) {
        self.output_json(&serde_json::json!({
            "selection": selection,
            "snapshot": snapshot,
        }));
    }

    fn watch_event(&self, event: &WatchEvent) {
        self.output_json_line(event);
    }

    fn config_info(&self, path: Option<&Path>, config: &ScannerConfig) {
        self.output_json(&serde_json::json!({
            "path": path.map(|p| p.display().to_string()),
            "config": config,
        }));
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        self.output_json(&serde_json::json!({
            "name": "bscan",
            "version": version,
            "git_sha": git_sha,
            "build_time": build_time,
        }));
    }
}
