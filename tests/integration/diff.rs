//! Device-list diffs across real rescans.

use bscan::device::mock::MockBoard;
use bscan::diff::{compare_device_lists, compare_device_lists_by_serial};
use bscan::registry::DeviceRegistry;

use crate::common::fixtures::{self, KONA4_FAMILY};
use crate::common::init_test_logging;

#[test]
fn test_unchanged_bench_has_no_diff() {
    init_test_logging();
    let registry = DeviceRegistry::new(fixtures::bench_driver());
    registry.scan_hardware();
    let before = registry.device_list();
    registry.scan_hardware();
    let after = registry.device_list();

    assert!(!compare_device_lists(&before, &after).has_changes());
    assert!(!compare_device_lists_by_serial(&before, &after).has_changes());
}

#[test]
fn test_first_scan_reports_everything_added() {
    init_test_logging();
    let registry = DeviceRegistry::new(fixtures::bench_driver());
    registry.scan_hardware();

    let diff = compare_device_lists(&[], &registry.device_list());
    assert_eq!(diff.added.len(), 2);
    assert!(diff.removed.is_empty());
}

#[test]
fn test_hot_plug_and_unplug() {
    init_test_logging();
    let driver = fixtures::bench_driver();
    let registry = DeviceRegistry::new(driver.clone());
    registry.scan_hardware();
    let before = registry.device_list();

    driver.hot_plug(fixtures::dnxiv());
    registry.scan_hardware();
    let plugged = registry.device_list();
    let diff = compare_device_lists(&before, &plugged);
    assert_eq!(diff.added.len(), 1);
    assert_eq!(diff.added[0].display_name, "avid dnxiv - 2");
    assert!(diff.removed.is_empty());

    driver.unplug(2);
    registry.scan_hardware();
    let diff = compare_device_lists(&plugged, &registry.device_list());
    assert!(diff.added.is_empty());
    assert_eq!(diff.removed.len(), 1);
    assert_eq!(diff.removed[0].serial_string().as_deref(), Some("1T000789"));
}

#[test]
fn test_slot_shift_positional_versus_serial() {
    init_test_logging();
    let driver = fixtures::bench_driver();
    let registry = DeviceRegistry::new(driver.clone());
    registry.scan_hardware();
    let before = registry.device_list();

    driver.unplug(0);
    registry.scan_hardware();
    let after = registry.device_list();

    let positional = compare_device_lists(&before, &after);
    assert_eq!(positional.removed.len(), 2);
    assert_eq!(positional.added.len(), 1);

    let keyed = compare_device_lists_by_serial(&before, &after);
    assert_eq!(keyed.removed.len(), 1);
    assert_eq!(keyed.removed[0].display_name, "kona4 - 0");
    assert!(keyed.added.is_empty());
}

#[test]
fn test_board_without_serial_never_added() {
    init_test_logging();
    let driver = fixtures::bench_driver();
    let registry = DeviceRegistry::new(driver.clone());
    registry.scan_hardware();
    let before = registry.device_list();

    driver.hot_plug(MockBoard::new(KONA4_FAMILY, "kona4", ""));
    registry.scan_hardware();
    let after = registry.device_list();

    assert_eq!(after.len(), 3);
    assert!(!compare_device_lists(&before, &after).has_changes());
    assert!(!compare_device_lists_by_serial(&before, &after).has_changes());
}
