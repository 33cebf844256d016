//! Virtual devices mapped onto physical boards.

use bscan::config::ScannerConfig;
use bscan::device::DeviceHandle;
use bscan::device::mock::{DriverOp, MockBench, MockDriver};
use bscan::registry::{DeviceRegistry, VirtualDeviceSource, VirtualMapStatus};
use bscan::resolver::{Resolver, virtual_locator, write_device_table};

use crate::common::fixtures::{self, BENCH_TOML, Workspace};
use crate::common::init_test_logging;

fn registry_with_map(ws: &Workspace) -> DeviceRegistry<MockDriver> {
    let driver = MockBench::from_toml(BENCH_TOML).unwrap().into_driver();
    let source = VirtualDeviceSource::new(ws.virtual_map(), 100);
    DeviceRegistry::new(driver).with_virtual_devices(Some(source))
}

#[test]
fn test_virtual_entries_follow_local_boards() {
    init_test_logging();
    let ws = Workspace::new();
    let registry = registry_with_map(&ws);

    let report = registry.scan_hardware();
    assert_eq!(report.local_devices, 2);
    assert_eq!(report.virtual_devices, 2);
    assert_eq!(report.total(), 4);
    assert_eq!(report.virtual_map, VirtualMapStatus::Loaded { entries: 1 });

    let devices = registry.device_list();
    let ids: Vec<_> = devices
        .iter()
        .map(|d| (d.index, d.virtual_device.as_ref().map(|vd| vd.id.as_str())))
        .collect();
    assert_eq!(
        ids,
        vec![(0, None), (1, None), (100, Some("vd-a")), (101, Some("vd-b"))]
    );
    assert_eq!(devices[2].family_id, devices[0].family_id);
    assert_eq!(devices[3].serial_number, devices[0].serial_number);
}

#[test]
fn test_table_has_virtual_section() {
    init_test_logging();
    let ws = Workspace::new();
    let registry = registry_with_map(&ws);
    registry.scan_hardware();

    let mut out: Vec<u8> = Vec::new();
    write_device_table(registry.driver(), &registry.device_list(), &mut out).unwrap();
    let table = String::from_utf8(out).unwrap();

    let lines: Vec<_> = table.lines().collect();
    assert_eq!(lines[0], "4 available devices:");
    assert_eq!(lines[1], "00 |    kona4 |  1T000123 | 0x3154303030313233");
    assert_eq!(lines[2], "01 |     io4k |  1T000456 | 0x3154303030343536");
    assert_eq!(lines[3], "*** Virtual Devices ***");
    assert_eq!(lines[4], "100 |        Studio A | vd-a (kona4 1T000123)");
    assert_eq!(lines[5], "101 |        Studio B | vd-b (kona4 1T000123)");
}

#[test]
fn test_select_virtual_by_index_name_and_id() {
    init_test_logging();
    let ws = Workspace::new();
    let registry = registry_with_map(&ws);
    let driver = registry.driver().clone();
    let resolver = Resolver::new(&registry);

    for argument in ["100", "Studio A", "vd-a"] {
        driver.clear_operations();
        let mut handle = resolver.from_argument_to(argument, &mut Vec::<u8>::new()).unwrap();
        assert_eq!(handle.serial_number_string().as_deref(), Some("1T000123"));
        handle.close();

        let source = registry.virtual_source().unwrap();
        let expected = virtual_locator(source, "1T000123", "vd-a");
        assert!(expected.starts_with("virtualdev://localhost/?config="));
        assert!(expected.ends_with("&serial=1T000123&vdid=vd-a"));
        driver.assert_operation_recorded(&DriverOp::OpenLocator { locator: expected });
    }
    assert_eq!(driver.open_handles(), 0);
}

#[test]
fn test_map_path_with_query_characters() {
    init_test_logging();
    let ws = Workspace::new();
    let map = ws.write("a&serial=1T000456?/devices.json", fixtures::VIRTUAL_MAP_JSON);
    let driver = MockBench::from_toml(BENCH_TOML).unwrap().into_driver();
    let registry = DeviceRegistry::new(driver.clone())
        .with_virtual_devices(Some(VirtualDeviceSource::new(map, 100)));
    let resolver = Resolver::new(&registry);

    let mut handle = resolver.from_argument_to("vd-b", &mut Vec::<u8>::new()).unwrap();
    assert_eq!(handle.index_number(), 0);
    assert_eq!(handle.serial_number_string().as_deref(), Some("1T000123"));
    handle.close();
    assert_eq!(driver.open_handles(), 0);
}

#[test]
fn test_index_base_at_u32_max_does_not_wrap() {
    init_test_logging();
    let ws = Workspace::new();
    let config = ScannerConfig::from_toml(&format!(
        "[virtual_devices]\nmap_path = {:?}\nindex_base = {}\n",
        ws.virtual_map().display().to_string(),
        u32::MAX
    ))
    .unwrap();
    let registry = DeviceRegistry::new(fixtures::bench_driver())
        .with_virtual_devices(config.virtual_source());

    let report = registry.scan_hardware();
    assert_eq!(report.virtual_devices, 1);

    let indices: Vec<u32> = registry.device_list().iter().map(|d| d.index).collect();
    assert_eq!(indices, vec![0, 1, u32::MAX]);
}

#[test]
fn test_lookups_skip_virtual_entries() {
    init_test_logging();
    let ws = Workspace::new();
    let registry = registry_with_map(&ws);
    let resolver = Resolver::new(&registry);

    assert!(resolver.by_index(2).unwrap_err().is_not_found());
    assert!(resolver.by_index(100).unwrap_err().is_not_found());

    let mut handle = resolver.by_name("kona4").unwrap();
    assert_eq!(handle.index_number(), 0);
    handle.close();
}

#[test]
fn test_missing_map_keeps_local_boards() {
    init_test_logging();
    let ws = Workspace::new();
    let driver = fixtures::bench_driver();
    let source = VirtualDeviceSource::new(ws.path().join("absent.json"), 100);
    let registry = DeviceRegistry::new(driver).with_virtual_devices(Some(source));

    let report = registry.scan_hardware();

    assert_eq!(report.local_devices, 2);
    assert_eq!(report.virtual_devices, 0);
    assert!(matches!(report.virtual_map, VirtualMapStatus::Unavailable { .. }));
}

#[test]
fn test_corrupt_map_is_unavailable() {
    init_test_logging();
    let ws = Workspace::new();
    let path = ws.write("devices.json", "{ \"v2\": ");
    let source = VirtualDeviceSource::new(path, 100);
    let registry = DeviceRegistry::new(fixtures::bench_driver()).with_virtual_devices(Some(source));

    let report = registry.scan_hardware();
    assert!(matches!(report.virtual_map, VirtualMapStatus::Unavailable { .. }));
    assert_eq!(registry.num_devices(), 2);
}
