//! Human-friendly output implementation using console.

use std::path::Path;

use console::style;
use tracing::{debug, instrument, trace};

use crate::config::ScannerConfig;
use crate::device::DeviceSnapshot;
use crate::error::ScanError;
use crate::registry::VirtualMapStatus;

use super::{DeviceListing, Output, Selection, WatchEvent};

/// Styled terminal output implementation for human users.
pub struct HumanOutput;

impl HumanOutput {
    #[instrument]
    pub fn new(color: bool) -> Self {
        debug!("Creating HumanOutput");
        if !color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        Self
    }

    fn board_line(device: &DeviceSnapshot) -> String {
        let serial = device.serial_string().unwrap_or_default();
        match &device.virtual_device {
            Some(vd) => format!("{} [{}] ({serial})", vd.name, vd.id),
            None if serial.is_empty() => device.display_name.clone(),
            None => format!("{} ({serial})", device.display_name),
        }
    }
}

impl Output for HumanOutput {
    #[instrument(skip(self))]
    fn error(&self, error: &ScanError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!("{} {}", style("[ERR]").red().bold(), style(error).bold());
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            eprintln!("  {} {}", style("Suggestion:").cyan(), style(suggestion).dim());
        }
    }

    #[instrument(skip(self))]
    fn warning(&self, message: &str) {
        eprintln!("{} {message}", style("[WARN]").yellow().bold());
    }

    #[instrument(skip(self, listing), fields(count = listing.devices.len()))]
    fn device_list(&self, listing: &DeviceListing, long: bool) {
        print!("{}", listing.table);

        if let VirtualMapStatus::Unavailable { path, reason } = &listing.report.virtual_map {
            self.warning(&format!("Virtual devices skipped, map {path} unavailable: {reason}"));
        }

        if long {
            for device in &listing.devices {
                println!();
                println!("{device}");
            }
        }
    }

    #[instrument(skip(self, selection), fields(index = selection.index))]
    fn device_selected(&self, selection: &Selection) {
        println!("{} {}", style("[OK]").green().bold(), selection.description);
        println!("  {} {}", style("Reference:").cyan(), selection.ref_name);
    }

    #[instrument(skip(self, selection, snapshot))]
    fn device_info(&self, selection: &Selection, snapshot: Option<&DeviceSnapshot>) {
        println!("{}", style(&selection.description).bold());
        match snapshot {
            Some(snapshot) => println!("{snapshot}"),
            None => self.warning("Board reports no family id; capabilities unavailable"),
        }
    }

    #[instrument(skip(self, event), fields(scan = event.scan))]
    fn watch_event(&self, event: &WatchEvent) {
        let stamp = event.report.scanned_at.format("%H:%M:%S").to_string();
        let stamp = style(stamp).dim();
        if event.scan == 1 {
            println!("{stamp} scan 1: {} device(s)", event.report.total());
        }
        for device in &event.diff.removed {
            let line = Self::board_line(device);
            println!("{stamp} {} {line}", style("-").red().bold());
        }
        for device in &event.diff.added {
            let line = Self::board_line(device);
            println!("{stamp} {} {line}", style("+").green().bold());
        }
    }

    #[instrument(skip(self, config))]
    fn config_info(&self, path: Option<&Path>, config: &ScannerConfig) {
        match path {
            Some(path) => println!("{} {}", style("Config file:").cyan(), path.display()),
            None => println!("{} (none)", style("Config file:").cyan()),
        }
        match toml::to_string_pretty(config) {
            Ok(text) => print!("{text}"),
            Err(e) => self.warning(&format!("Could not render configuration: {e}")),
        }
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        println!("{} {version}", style("bscan").bold());
        if let Some(sha) = git_sha {
            println!("  {} {sha}", style("commit:").dim());
        }
        if let Some(time) = build_time {
            println!("  {} {time}", style("built:").dim());
        }
    }
}
