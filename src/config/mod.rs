//! Configuration: the settings file and the virtual-device map.

mod path;
mod settings;
mod virtual_map;

pub use path::{PathResolver, home_dir, resolve_path};
pub use settings::{
    CONFIG_ENV, DEFAULT_VIRTUAL_INDEX_BASE, DriverConfig, ScannerConfig, VirtualDevicesConfig,
};
pub use virtual_map::VirtualDeviceMap;
