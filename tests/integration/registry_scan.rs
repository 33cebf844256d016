//! Device registry scans against the simulated driver.

use std::thread;
use std::time::Duration;

use bscan::device::mock::{DriverOp, MockBench, MockBoard, MockDriver};
use bscan::device::{Count, Feature, FamilyId};
use bscan::registry::{DeviceRegistry, VirtualMapStatus};

use crate::common::fixtures::{self, BENCH_TOML, IO4K_FAMILY, KONA4_FAMILY};
use crate::common::init_test_logging;

#[test]
fn test_bench_file_scan() {
    init_test_logging();
    let ws = fixtures::Workspace::new();
    let driver = MockBench::load(&ws.bench()).unwrap().into_driver();
    let registry = DeviceRegistry::new(driver);

    let report = registry.scan_hardware();
    assert_eq!(report.local_devices, 2);
    assert_eq!(report.virtual_devices, 0);
    assert_eq!(report.virtual_map, VirtualMapStatus::Disabled);

    let devices = registry.device_list();
    assert_eq!(devices[0].display_name, "kona4 - 0");
    assert_eq!(devices[0].pci_slot, 3);
    assert_eq!(devices[0].video.num_video_inputs, 4);
    assert!(devices[0].video.video_4k);
    assert!(devices[0].video.multi_format);
    assert_eq!(devices[0].audio.num_audio_streams, 2);
    assert!(devices[1].audio.sample_rates.is_empty());
    assert_eq!(devices[1].display_name, "io4k - 1");
    assert_eq!(devices[1].family_id, FamilyId::from_raw(IO4K_FAMILY));
}

#[test]
fn test_remote_boards_are_not_enumerated() {
    init_test_logging();
    let driver = MockBench::from_toml(BENCH_TOML).unwrap().into_driver();
    let registry = DeviceRegistry::new(driver);

    registry.scan_hardware();

    assert_eq!(registry.num_devices(), 2);
    assert!(registry
        .device_list()
        .iter()
        .all(|d| d.serial_string().as_deref() != Some("9R000777")));
}

#[test]
fn test_every_slot_open_is_closed() {
    init_test_logging();
    let driver = fixtures::bench_driver();
    let registry = DeviceRegistry::new(driver.clone());

    registry.scan_hardware();
    registry.scan_hardware();

    assert_eq!(driver.open_handles(), 0);
    assert_eq!(driver.open_count(), 6);
    driver.assert_operation_recorded(&DriverOp::Close { index: 1 });
}

#[test]
fn test_hot_plug_seen_only_after_rescan() {
    init_test_logging();
    let driver = fixtures::bench_driver();
    let registry = DeviceRegistry::new(driver.clone());
    registry.scan_hardware();

    driver.hot_plug(fixtures::dnxiv());
    assert_eq!(registry.num_devices(), 2);
    assert!(registry.device_info(2, false).is_none());

    let fresh = registry.device_info(2, true).unwrap();
    assert_eq!(fresh.display_name, "avid dnxiv - 2");
    assert_eq!(registry.num_devices(), 3);
}

#[test]
fn test_unplug_shifts_later_slots() {
    init_test_logging();
    let driver = MockDriver::new(vec![fixtures::kona4(), fixtures::io4k(), fixtures::dnxiv()]);
    let registry = DeviceRegistry::new(driver.clone());
    registry.scan_hardware();

    let removed = driver.unplug(0).unwrap();
    assert_eq!(removed.model, "kona4");
    registry.scan_hardware();

    let devices = registry.device_list();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].display_name, "io4k - 0");
    assert!(!registry.device_id_present(FamilyId::from_raw(KONA4_FAMILY).unwrap(), false));
}

#[test]
fn test_family_less_board_leaves_positional_gap() {
    init_test_logging();
    let blank = MockBoard::new(0, "blank", "1T000000");
    let driver = MockDriver::new(vec![blank, fixtures::io4k()]);
    let registry = DeviceRegistry::new(driver.clone());

    let report = registry.scan_hardware();

    assert_eq!(report.local_devices, 1);
    assert_eq!(registry.device_list()[0].index, 1);
    assert!(registry.device_info(0, false).is_none());
    assert!(registry.device_info(1, false).is_none());
    assert_eq!(driver.open_handles(), 0);
}

#[test]
fn test_capabilities_from_driver_queries() {
    init_test_logging();
    let board = fixtures::kona4()
        .with_feature(Feature::HasMicrophoneInput)
        .with_variant_model("kona4 mic")
        .with_count(Count::NumLtcInputs, 1)
        .with_count(Count::NumHdmiVideoOutputs, 2);
    let registry = DeviceRegistry::new(MockDriver::new(vec![board]));

    registry.scan_hardware();
    let device = registry.device_info(0, false).unwrap();

    assert_eq!(device.display_name, "kona4 mic - 0");
    assert!(device.video.ltc_in);
    assert!(!device.video.ltc_out);
    assert_eq!(device.video.num_hdmi_video_outputs, 2);
}

#[test]
fn test_readers_never_see_partial_list() {
    init_test_logging();
    let boards = vec![
        fixtures::kona4(),
        fixtures::io4k(),
        fixtures::dnxiv(),
        MockBoard::new(KONA4_FAMILY, "kona4", "1T000999"),
    ];
    let driver = MockDriver::new(boards).with_open_delay(Duration::from_millis(2));
    let registry = DeviceRegistry::new(driver);

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..5 {
                registry.scan_hardware();
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..50 {
                    let seen = registry.num_devices();
                    assert!(seen == 0 || seen == 4, "observed partial list of {seen}");
                    thread::sleep(Duration::from_millis(1));
                }
            });
        }
    });

    assert_eq!(registry.num_devices(), 4);
}

#[test]
fn test_concurrent_rescans_serialize() {
    init_test_logging();
    let driver = fixtures::bench_driver().with_open_delay(Duration::from_millis(1));
    let registry = DeviceRegistry::new(driver.clone());

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| registry.scan_hardware());
        }
    });

    assert_eq!(registry.num_devices(), 2);
    assert_eq!(driver.open_count(), 12);
    assert_eq!(driver.open_handles(), 0);
}
