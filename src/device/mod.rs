//! Driver abstraction layer for capture boards.
//!
//! The low-level driver that opens a board and exposes its identity and
//! capability registers lives outside this crate. These traits are the
//! seam: the registry and resolver only ever talk to a [`DeviceDriver`]
//! and the [`DeviceHandle`]s it opens, so tests and the `--bench`
//! simulator can stand in for real hardware.

mod info;
pub mod mock;
mod snapshot;

pub use info::{
    AudioBitsPerSample, AudioChannels, AudioSampleRate, AudioSource, Count, FamilyId, Feature,
    SerialNumber,
};
pub use snapshot::{AudioCapabilities, DeviceSnapshot, VideoCapabilities, VirtualDeviceInfo};

use crate::error::Result;

/// Bit in the first audio system's control register that reports an AES
/// input is wired.
pub const AUDIO_CONTROL_AES_PRESENT: u32 = 1 << 21;

/// Locator scheme for boards presented through the virtual-device map.
pub const VIRTUAL_SCHEME: &str = "virtualdev://";

/// Open/close service for boards.
pub trait DeviceDriver {
    /// Handle type returned by the open calls.
    type Handle: DeviceHandle;

    /// Open the board at local slot `index`.
    ///
    /// # Errors
    ///
    /// Fails when nothing answers at that slot. The registry treats the
    /// first such failure as the end of the local device space.
    fn open_at_index(&self, index: u32) -> Result<Self::Handle>;

    /// Open a board by locator string (index, serial, model, host, or a
    /// driver-specific URL).
    fn open_at_locator(&self, locator: &str) -> Result<Self::Handle>;

    /// Display name for a family. `variant` selects the alternate name
    /// some families carry (e.g. the microphone-equipped model).
    fn family_name(&self, family: FamilyId, variant: bool) -> Option<String>;
}

/// Capability-query service over one open board.
///
/// Every query is a read; none of them change device state.
pub trait DeviceHandle {
    /// Whether the handle still refers to an open board.
    fn is_open(&self) -> bool;

    /// Local slot number (or the driver's index for remote boards).
    fn index_number(&self) -> u32;

    /// Family id, `None` if the board reports "not found".
    fn family_id(&self) -> Option<FamilyId>;

    /// Cached 64-bit serial register.
    fn serial_number(&self) -> Option<SerialNumber>;

    /// Fresh read of the printed serial string.
    fn serial_number_string(&self) -> Option<String>;

    /// Query a boolean capability.
    fn is_supported(&self, feature: Feature) -> bool;

    /// Query a numeric capability.
    fn num_supported(&self, count: Count) -> u32;

    /// First audio system's control register.
    fn audio_control(&self) -> u32 {
        0
    }

    /// Bus slot location, part of the board's identity.
    fn pci_slot(&self) -> u32 {
        0
    }

    /// Host name or address for boards reached over the network.
    fn host_name(&self) -> Option<String> {
        None
    }

    /// True if the board is not locally attached.
    fn is_remote(&self) -> bool {
        false
    }

    /// Release the board. Further queries see a closed handle.
    fn close(&mut self);
}
