//! Virtual-device map: which logical devices sit on which physical board.
//!
//! The map is the control-panel JSON document:
//!
//! ```json
//! { "v2": { "deviceConfigList": [
//!     { "serial": "1T000123",
//!       "virtualDevices": [ { "id": "vd-1", "name": "Studio A" } ] } ] } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::device::VirtualDeviceInfo;
use crate::error::{Result, ScanError};

#[derive(Debug, Deserialize)]
struct MapDocument {
    v2: MapBody,
}

#[derive(Debug, Deserialize)]
struct MapBody {
    #[serde(rename = "deviceConfigList", default)]
    device_config_list: Vec<HardwareEntry>,
}

#[derive(Debug, Deserialize)]
struct HardwareEntry {
    serial: String,
    #[serde(rename = "virtualDevices", default)]
    virtual_devices: Vec<VirtualEntry>,
}

#[derive(Debug, Deserialize)]
struct VirtualEntry {
    id: String,
    name: String,
}

/// Physical serial string to the virtual devices it hosts, in map order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualDeviceMap {
    entries: BTreeMap<String, Vec<VirtualDeviceInfo>>,
}

impl VirtualDeviceMap {
    /// Parse a map document.
    ///
    /// Hardware entries without virtual devices are dropped. A serial listed
    /// twice accumulates both lists.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: MapDocument =
            serde_json::from_str(text).map_err(|e| ScanError::ConfigParse(e.to_string()))?;

        let mut entries: BTreeMap<String, Vec<VirtualDeviceInfo>> = BTreeMap::new();
        for hw in doc.v2.device_config_list {
            if hw.virtual_devices.is_empty() {
                trace!(serial = %hw.serial, "No virtual devices for board");
                continue;
            }
            entries.entry(hw.serial).or_default().extend(
                hw.virtual_devices
                    .into_iter()
                    .map(|vd| VirtualDeviceInfo { id: vd.id, name: vd.name }),
            );
        }
        Ok(Self { entries })
    }

    /// Read and parse the map at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigUnavailable` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| ScanError::ConfigUnavailable {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let map = Self::from_json(&text).map_err(|e| unavailable(e.to_string()))?;
        debug!(path = %path.display(), boards = map.entries.len(), "Loaded virtual device map");
        Ok(map)
    }

    /// Virtual devices hosted by the board with this serial string.
    pub fn devices_for(&self, serial: &str) -> &[VirtualDeviceInfo] {
        self.entries.get(serial).map_or(&[], Vec::as_slice)
    }

    /// Number of virtual devices across all boards.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
