//! Resolving user arguments to open boards.

use bscan::device::mock::{DriverOp, MockBench, MockDriver};
use bscan::device::{DeviceHandle, FamilyId};
use bscan::error::ScanError;
use bscan::ident::parse_hex_serial;
use bscan::registry::DeviceRegistry;
use bscan::resolver::Resolver;

use crate::common::capture::capture_stdout;
use crate::common::fixtures::{self, BENCH_TOML, KONA4_FAMILY};
use crate::common::init_test_logging;

fn bench_registry() -> (MockDriver, DeviceRegistry<MockDriver>) {
    let driver = MockBench::from_toml(BENCH_TOML).unwrap().into_driver();
    (driver.clone(), DeviceRegistry::new(driver))
}

#[test]
fn test_from_argument_forms() {
    init_test_logging();
    let (driver, registry) = bench_registry();
    let resolver = Resolver::new(&registry);
    let mut sink: Vec<u8> = Vec::new();

    for (argument, index, serial) in [
        ("1", 1, "1T000456"),
        ("kona4", 0, "1T000123"),
        ("1t000456", 1, "1T000456"),
        ("0x3154303030313233", 0, "1T000123"),
        ("10.0.0.5:7000", 0, "9R000777"),
    ] {
        let mut handle = resolver.from_argument_to(argument, &mut sink).unwrap();
        assert_eq!(handle.index_number(), index, "argument {argument}");
        assert_eq!(handle.serial_number_string().as_deref(), Some(serial));
        handle.close();
    }
    assert!(sink.is_empty());
    assert_eq!(driver.open_handles(), 0);
}

#[test]
fn test_list_argument_prints_table() {
    init_test_logging();
    let (driver, registry) = bench_registry();
    let resolver = Resolver::new(&registry);

    let (result, stdout) = capture_stdout(|| resolver.from_argument("LIST"));

    assert!(matches!(result, Err(ScanError::ListingOnly)));
    assert!(stdout.contains("2 available devices:"), "stdout: {stdout}");
    assert!(stdout.contains("00 |    kona4 |  1T000123 | 0x3154303030313233"));
    assert_eq!(driver.open_handles(), 0);
}

#[test]
fn test_unknown_argument_fails_to_open() {
    init_test_logging();
    let (_, registry) = bench_registry();
    let resolver = Resolver::new(&registry);

    let err = resolver.from_argument_to("corvid88", &mut Vec::<u8>::new()).unwrap_err();
    assert!(matches!(err, ScanError::DeviceOpenFailed { .. }), "{err:?}");

    let err = resolver.from_argument_to("", &mut Vec::<u8>::new()).unwrap_err();
    assert!(matches!(err, ScanError::MalformedIdentifier { .. }));
    assert!(!err.is_not_found());
}

#[test]
fn test_lookups_use_fresh_list() {
    init_test_logging();
    let (driver, registry) = bench_registry();
    let resolver = Resolver::new(&registry);

    assert!(resolver.by_index(2).unwrap_err().is_not_found());

    driver.hot_plug(fixtures::dnxiv());
    let mut handle = resolver.by_index(2).unwrap();
    assert_eq!(handle.serial_number_string().as_deref(), Some("1T000789"));
    handle.close();

    let mut handle = resolver.by_name("io4kplus").unwrap();
    assert_eq!(handle.index_number(), 2);
    handle.close();
}

#[test]
fn test_by_family_id_picks_first_slot() {
    init_test_logging();
    let driver = MockDriver::new(vec![fixtures::io4k(), fixtures::kona4(), fixtures::kona4()]);
    let registry = DeviceRegistry::new(driver);
    let resolver = Resolver::new(&registry);

    let family = FamilyId::from_raw(KONA4_FAMILY).unwrap();
    let mut handle = resolver.by_family_id(family).unwrap();
    assert_eq!(handle.index_number(), 1);
    handle.close();

    let missing = FamilyId::from_raw(0x1234_5678).unwrap();
    assert!(resolver.by_family_id(missing).unwrap_err().is_not_found());
}

#[test]
fn test_serial_lookups() {
    init_test_logging();
    let (driver, registry) = bench_registry();
    let resolver = Resolver::new(&registry);

    let mut handle = resolver.by_serial_string("T00045").unwrap();
    assert_eq!(handle.index_number(), 1);
    assert_eq!(driver.open_handles(), 1);
    handle.close();

    let serial = parse_hex_serial("0x3154303030313233").unwrap();
    let mut handle = resolver.by_serial_number(serial).unwrap();
    assert_eq!(handle.index_number(), 0);
    handle.close();

    let err = resolver.by_serial_string("9R000777").unwrap_err();
    assert!(
        err.is_not_found(),
        "remote boards are not part of the local list: {err:?}"
    );
    assert_eq!(driver.open_handles(), 0);
}

#[test]
fn test_name_locator_goes_straight_to_driver() {
    init_test_logging();
    let (driver, registry) = bench_registry();
    let resolver = Resolver::new(&registry);

    let mut handle = resolver.by_name("10.0.0.5:7000").unwrap();
    assert!(handle.is_remote());
    assert_eq!(resolver.ref_name(&handle), "10.0.0.5:7000");
    assert_eq!(
        resolver.describe(&handle),
        "kona4 '9R000777' on '10.0.0.5:7000' at index 0"
    );
    handle.close();

    driver.assert_operations(&[
        DriverOp::OpenLocator {
            locator: "10.0.0.5:7000".into(),
        },
        DriverOp::ReadSerialString { index: 0 },
        DriverOp::Close { index: 0 },
    ]);
}

#[test]
fn test_ref_name_round_trips_through_from_argument() {
    init_test_logging();
    let (_, registry) = bench_registry();
    let resolver = Resolver::new(&registry);

    let mut first = resolver.by_index(1).unwrap();
    let name = resolver.ref_name(&first);
    first.close();
    assert_eq!(name, "1T000456");

    let mut again = resolver.from_argument_to(&name, &mut Vec::<u8>::new()).unwrap();
    assert_eq!(again.index_number(), 1);
    again.close();
    assert_eq!(resolver.ref_name(&again), "");
}
