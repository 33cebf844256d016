//! Scanner settings file.
//!
//! # Example TOML
//!
//! ```toml
//! [driver]
//! bench = "bench.toml"
//!
//! [virtual_devices]
//! enabled = true
//! map_path = "~/.local/share/bscan/virtual_devices.json"
//! index_base = 100
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::path::PathResolver;
use crate::error::{Result, ScanError};
use crate::ident::MAX_INDEX_DIGITS;
use crate::registry::VirtualDeviceSource;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "BSCAN_CONFIG";

/// First index handed to virtual devices.
pub const DEFAULT_VIRTUAL_INDEX_BASE: u32 = 100;

/// Driver selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DriverConfig {
    /// Bench file describing simulated boards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bench: Option<PathBuf>,
}

/// Virtual-device overlay settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VirtualDevicesConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Control-panel map file. Virtual support is off while this is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_path: Option<PathBuf>,

    #[serde(default = "default_index_base")]
    pub index_base: u32,
}

const fn default_enabled() -> bool {
    true
}

const fn default_index_base() -> u32 {
    DEFAULT_VIRTUAL_INDEX_BASE
}

impl Default for VirtualDevicesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            map_path: None,
            index_base: default_index_base(),
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub virtual_devices: VirtualDevicesConfig,
}

impl ScannerConfig {
    /// Parse settings from TOML. Paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` for invalid TOML and `ConfigInvalid` if a
    /// value is out of range.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ScanError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location: `$BSCAN_CONFIG`, else
    /// `<config dir>/bscan/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("bscan").join("config.toml"))
    }

    /// Load from the default location. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit file and resolve its paths against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScanError::ConfigParse(format!("reading {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml(&text)?;

        let resolver = PathResolver::new(path)?;
        config.resolve_paths(&resolver)?;
        debug!(?config, "Loaded config");
        Ok(config)
    }

    /// Rewrite relative and `~` paths through `resolver`.
    pub fn resolve_paths(&mut self, resolver: &PathResolver) -> Result<()> {
        if let Some(bench) = self.driver.bench.take() {
            self.driver.bench = Some(resolver.resolve(&bench)?);
        }
        if let Some(map) = self.virtual_devices.map_path.take() {
            self.virtual_devices.map_path = Some(resolver.resolve(&map)?);
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// Virtual indices must start above every index a local slot can have.
    pub fn validate(&self) -> Result<()> {
        trace!("Validating scanner config");
        let max_local = 10u32.pow(u32::try_from(MAX_INDEX_DIGITS).unwrap_or(2));
        if self.virtual_devices.index_base < max_local {
            return Err(ScanError::ConfigInvalid(format!(
                "virtual_devices.index_base must be at least {max_local}, got {}",
                self.virtual_devices.index_base
            )));
        }
        Ok(())
    }

    /// Virtual-device source for the registry, if the overlay is active.
    pub fn virtual_source(&self) -> Option<VirtualDeviceSource> {
        let vd = &self.virtual_devices;
        if !vd.enabled {
            return None;
        }
        vd.map_path
            .as_ref()
            .map(|path| VirtualDeviceSource::new(path.clone(), vd.index_base))
    }
}
