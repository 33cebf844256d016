//! Settings files feeding the registry.

use bscan::config::{CONFIG_ENV, ScannerConfig};
use bscan::device::mock::MockBench;
use bscan::error::ScanError;
use bscan::registry::{DeviceRegistry, VirtualMapStatus};

use crate::common::env::{EnvGuard, with_config_file};
use crate::common::fixtures::Workspace;
use crate::common::init_test_logging;

#[test]
fn test_config_file_drives_scan() {
    init_test_logging();
    let ws = Workspace::new();
    let config = ScannerConfig::load_from(&ws.config(true)).unwrap();

    let bench = config.driver.bench.as_ref().unwrap();
    assert!(bench.is_absolute() && bench.exists());

    let driver = MockBench::load(bench).unwrap().into_driver();
    let registry = DeviceRegistry::new(driver).with_virtual_devices(config.virtual_source());
    let report = registry.scan_hardware();

    assert_eq!(report.local_devices, 2);
    assert_eq!(report.virtual_devices, 2);
    assert_eq!(report.virtual_map, VirtualMapStatus::Loaded { entries: 1 });
}

#[test]
fn test_env_var_selects_config_file() {
    init_test_logging();
    let ws = Workspace::new();
    let path = ws.config(false);
    let _guard = with_config_file(&path);

    assert_eq!(ScannerConfig::default_path(), Some(path));
    let config = ScannerConfig::load().unwrap();
    assert!(config.driver.bench.is_some());
    assert!(config.virtual_source().is_none());
}

#[test]
fn test_env_var_pointing_nowhere_yields_defaults() {
    init_test_logging();
    let ws = Workspace::new();
    let missing = ws.path().join("nope.toml");
    let _guard = EnvGuard::set(CONFIG_ENV, &missing.to_string_lossy());

    assert_eq!(ScannerConfig::load().unwrap(), ScannerConfig::default());
}

#[test]
fn test_invalid_config_reports_reason() {
    init_test_logging();
    let ws = Workspace::new();
    let path = ws.write("config.toml", "[virtual_devices]\nindex_base = 7\n");

    let err = ScannerConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ScanError::ConfigInvalid(_)), "{err:?}");
    assert!(err.to_string().contains("index_base"));
    assert!(err.suggestion().is_some());
}

#[test]
fn test_bench_with_unknown_field_type_is_parse_error() {
    init_test_logging();
    let ws = Workspace::new();
    let path = ws.write("bench.toml", "[[boards]]\nfamily = \"kona\"\nmodel = \"x\"\nserial = \"y\"\n");

    let err = MockBench::load(&path).unwrap_err();
    assert!(matches!(err, ScanError::ConfigParse(_)), "{err:?}");
}
