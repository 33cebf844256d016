//! Bench, virtual-map and config files for tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bscan::device::mock::{MockBoard, MockDriver};
use tempfile::TempDir;
use tracing::{debug, instrument};

pub const KONA4_FAMILY: u32 = 0x1051_8400;
pub const IO4K_FAMILY: u32 = 0x1047_8300;
pub const DNXIV_FAMILY: u32 = 0x1056_8320;

/// Bench with two local boards and one remote board.
pub const BENCH_TOML: &str = r#"
[[boards]]
family = 0x10518400
model = "kona4"
serial = "1T000123"
pci_slot = 3
features = ["can_do_4k_video", "can_do_multi_format"]

[boards.counts]
num_video_inputs = 4
num_video_outputs = 4
num_audio_systems = 2

[[boards]]
family = 0x10478300
model = "io4k"
serial = "1T000456"

[[remote]]
family = 0x10518400
model = "kona4"
serial = "9R000777"
host = "10.0.0.5:7000"
"#;

/// Two virtual devices on the first bench board.
pub const VIRTUAL_MAP_JSON: &str = r#"{
  "v2": {
    "deviceConfigList": [
      {
        "serial": "1T000123",
        "virtualDevices": [
          { "id": "vd-a", "name": "Studio A" },
          { "id": "vd-b", "name": "Studio B" }
        ]
      },
      { "serial": "1T000456", "virtualDevices": [] }
    ]
  }
}"#;

pub fn kona4() -> MockBoard {
    MockBoard::new(KONA4_FAMILY, "kona4", "1T000123").with_pci_slot(3)
}

pub fn io4k() -> MockBoard {
    MockBoard::new(IO4K_FAMILY, "io4k", "1T000456")
}

pub fn dnxiv() -> MockBoard {
    MockBoard::new(DNXIV_FAMILY, "avid dnxiv", "1T000789")
}

/// Driver with the two local bench boards.
pub fn bench_driver() -> MockDriver {
    MockDriver::new(vec![kona4(), io4k()])
}

/// Temporary directory holding test input files.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    #[instrument]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        debug!(path = %dir.path().display(), "Created test workspace");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        fs::write(&path, content).expect("failed to write fixture");
        path
    }

    pub fn bench(&self) -> PathBuf {
        self.write("bench.toml", BENCH_TOML)
    }

    pub fn virtual_map(&self) -> PathBuf {
        self.write("devices.json", VIRTUAL_MAP_JSON)
    }

    /// Config file pointing at `bench.toml` and, optionally, `devices.json`
    /// next to it.
    pub fn config(&self, with_virtual: bool) -> PathBuf {
        self.bench();
        let mut text = String::from("[driver]\nbench = \"bench.toml\"\n");
        if with_virtual {
            self.virtual_map();
            text.push_str("\n[virtual_devices]\nmap_path = \"devices.json\"\n");
        }
        self.write("config.toml", &text)
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
