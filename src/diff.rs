//! Differences between two device lists.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::device::{DeviceSnapshot, SerialNumber};

/// Entries that disappeared from (`removed`) or appeared in (`added`) a
/// device list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceListDiff {
    pub added: Vec<DeviceSnapshot>,
    pub removed: Vec<DeviceSnapshot>,
}

impl DeviceListDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Entries without a family id or serial never count as additions.
fn is_reportable(device: &DeviceSnapshot) -> bool {
    device.family_id.is_some() && device.serial_number.is_some()
}

/// Positional diff: walk both lists in lock step.
///
/// At each shared position an unequal pair reports the old entry as
/// removed and the new one as added. Whatever is left over in the longer
/// list is removed (old) or added (new).
///
/// Both lists must be ordered by the same stable key. A board that only
/// moved position is reported as removed and added; use
/// [`compare_device_lists_by_serial`] to ignore moves.
pub fn compare_device_lists(old: &[DeviceSnapshot], new: &[DeviceSnapshot]) -> DeviceListDiff {
    let mut diff = DeviceListDiff::default();

    for (before, after) in old.iter().zip(new) {
        if before != after {
            trace!(index = before.index, "Entry changed");
            diff.removed.push(before.clone());
            if is_reportable(after) {
                diff.added.push(after.clone());
            }
        }
    }

    let shared = old.len().min(new.len());
    diff.removed.extend(old[shared..].iter().cloned());
    diff.added
        .extend(new[shared..].iter().filter(|d| is_reportable(d)).cloned());

    diff
}

type DeviceKey = (SerialNumber, Option<String>);

fn key_of(device: &DeviceSnapshot) -> Option<DeviceKey> {
    let serial = device.serial_number?;
    Some((serial, device.virtual_device.as_ref().map(|vd| vd.id.clone())))
}

/// Order-independent diff keyed by serial number and virtual-device id.
///
/// A board that moved to another slot but kept its family is unchanged.
/// A key whose family changed is reported as removed and added. Old
/// entries without a serial are always removed; new ones are never added.
pub fn compare_device_lists_by_serial(
    old: &[DeviceSnapshot],
    new: &[DeviceSnapshot],
) -> DeviceListDiff {
    let mut diff = DeviceListDiff::default();

    let new_by_key: BTreeMap<DeviceKey, &DeviceSnapshot> =
        new.iter().filter_map(|d| Some((key_of(d)?, d))).collect();
    let old_by_key: BTreeMap<DeviceKey, &DeviceSnapshot> =
        old.iter().filter_map(|d| Some((key_of(d)?, d))).collect();

    for before in old {
        let still_there = key_of(before)
            .and_then(|key| new_by_key.get(&key))
            .is_some_and(|after| after.family_id == before.family_id);
        if !still_there {
            diff.removed.push(before.clone());
        }
    }

    for after in new.iter().filter(|d| is_reportable(d)) {
        let was_there = key_of(after)
            .and_then(|key| old_by_key.get(&key))
            .is_some_and(|before| before.family_id == after.family_id);
        if !was_there {
            diff.added.push(after.clone());
        }
    }

    diff
}
