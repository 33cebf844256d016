//! Device registry: the authoritative list of attached boards.
//!
//! A [`DeviceRegistry`] owns a driver and the snapshot list built by the
//! last [`scan_hardware`](DeviceRegistry::scan_hardware). The list sits
//! behind a single mutex; a rescan holds it across every slot open, so
//! concurrent readers only ever see a complete list from one scan.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::VirtualDeviceMap;
use crate::device::{DeviceDriver, DeviceHandle, DeviceSnapshot, FamilyId};
use crate::error::Result;

/// Where virtual devices come from and where their indices start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDeviceSource {
    map_path: PathBuf,
    index_base: u32,
}

impl VirtualDeviceSource {
    pub const fn new(map_path: PathBuf, index_base: u32) -> Self {
        Self {
            map_path,
            index_base,
        }
    }

    pub fn map_path(&self) -> &Path {
        &self.map_path
    }

    pub const fn index_base(&self) -> u32 {
        self.index_base
    }

    fn load(&self) -> Result<VirtualDeviceMap> {
        VirtualDeviceMap::load(&self.map_path)
    }
}

/// Outcome of loading the virtual-device map during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VirtualMapStatus {
    /// No virtual-device source configured.
    Disabled,
    /// Map read; `entries` virtual devices listed in it.
    Loaded { entries: usize },
    /// Map missing or unparsable. The scan carried on without it.
    Unavailable { path: String, reason: String },
}

/// Summary of one rescan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub local_devices: usize,
    pub virtual_devices: usize,
    pub virtual_map: VirtualMapStatus,
    pub scanned_at: DateTime<Utc>,
}

impl ScanReport {
    pub const fn total(&self) -> usize {
        self.local_devices + self.virtual_devices
    }
}

/// Authoritative device list for one driver.
pub struct DeviceRegistry<D: DeviceDriver> {
    driver: D,
    virtual_source: Option<VirtualDeviceSource>,
    devices: Mutex<Vec<DeviceSnapshot>>,
}

impl<D: DeviceDriver> DeviceRegistry<D> {
    /// Create an empty registry. Nothing is opened until the first scan.
    pub const fn new(driver: D) -> Self {
        Self {
            driver,
            virtual_source: None,
            devices: Mutex::new(Vec::new()),
        }
    }

    /// Merge virtual devices from `source` on every scan.
    #[must_use]
    pub fn with_virtual_devices(mut self, source: Option<VirtualDeviceSource>) -> Self {
        self.virtual_source = source;
        self
    }

    pub const fn driver(&self) -> &D {
        &self.driver
    }

    pub const fn virtual_source(&self) -> Option<&VirtualDeviceSource> {
        self.virtual_source.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeviceSnapshot>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild the device list from the hardware.
    ///
    /// Slots are opened from 0 upward until the first one that fails to
    /// open. Boards without a family id are skipped. Every opened handle
    /// is closed before the next slot open.
    #[instrument(skip(self))]
    pub fn scan_hardware(&self) -> ScanReport {
        let mut devices = self.lock();
        self.rescan_locked(&mut devices)
    }

    fn rescan_locked(&self, devices: &mut Vec<DeviceSnapshot>) -> ScanReport {
        let mut fresh = Vec::new();

        for index in 0u32.. {
            let mut handle = match self.driver.open_at_index(index) {
                Ok(handle) => handle,
                Err(e) => {
                    trace!(index, error = %e, "End of local slots");
                    break;
                }
            };
            if let Some(snapshot) = DeviceSnapshot::capture(&self.driver, &handle, index) {
                debug!(index, name = %snapshot.display_name, "Found board");
                fresh.push(snapshot);
            }
            handle.close();
        }

        let local_devices = fresh.len();
        let virtual_map = self.merge_virtual(&mut fresh);
        let virtual_devices = fresh.len() - local_devices;

        *devices = fresh;

        let report = ScanReport {
            local_devices,
            virtual_devices,
            virtual_map,
            scanned_at: Utc::now(),
        };
        info!(
            local = report.local_devices,
            virtual_devices = report.virtual_devices,
            "Scan complete"
        );
        report
    }

    /// Append a copy of each local board per virtual device mapped onto it.
    fn merge_virtual(&self, devices: &mut Vec<DeviceSnapshot>) -> VirtualMapStatus {
        let Some(source) = &self.virtual_source else {
            return VirtualMapStatus::Disabled;
        };

        let map = match source.load() {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %source.map_path().display(), error = %e, "Virtual device map unavailable");
                return VirtualMapStatus::Unavailable {
                    path: source.map_path().display().to_string(),
                    reason: e.to_string(),
                };
            }
        };

        let mut next_index = Some(source.index_base());
        let mut virtuals = Vec::new();
        'boards: for local in devices.iter() {
            let Some(serial) = local.serial_string() else {
                continue;
            };
            for vd in map.devices_for(&serial) {
                let Some(index) = next_index else {
                    warn!(
                        index_base = source.index_base(),
                        added = virtuals.len(),
                        "Virtual device indices exhausted, skipping the rest of the map"
                    );
                    break 'boards;
                };
                trace!(index, id = %vd.id, serial = %serial, "Adding virtual device");
                virtuals.push(local.as_virtual(index, vd.clone()));
                next_index = index.checked_add(1);
            }
        }
        devices.extend(virtuals);

        VirtualMapStatus::Loaded { entries: map.len() }
    }

    /// Number of entries in the current list, without rescanning.
    pub fn num_devices(&self) -> usize {
        self.lock().len()
    }

    /// Copy of the current list, without rescanning.
    pub fn device_list(&self) -> Vec<DeviceSnapshot> {
        self.lock().clone()
    }

    /// True if some entry has this family id.
    pub fn device_id_present(&self, family: FamilyId, rescan: bool) -> bool {
        let mut devices = self.lock();
        if rescan {
            self.rescan_locked(&mut devices);
        }
        devices.iter().any(|d| d.family_id == Some(family))
    }

    /// Entry at position `index`.
    ///
    /// Returns `None` if the position is out of range or the entry there
    /// carries a different index, as happens once a slot has gone missing.
    pub fn device_info(&self, index: u32, rescan: bool) -> Option<DeviceSnapshot> {
        let mut devices = self.lock();
        if rescan {
            self.rescan_locked(&mut devices);
        }
        let entry = devices.get(usize::try_from(index).ok()?)?;
        (entry.index == index).then(|| entry.clone())
    }

    /// Rescan, then run `f` on the fresh list while still holding the lock.
    pub(crate) fn with_rescanned<R>(&self, f: impl FnOnce(&D, &[DeviceSnapshot]) -> R) -> R {
        let mut devices = self.lock();
        self.rescan_locked(&mut devices);
        f(&self.driver, &devices)
    }
}
