//! Simulated driver for tests and hardware-free runs.
//!
//! A [`MockDriver`] owns an inventory of [`MockBoard`]s: local boards sit
//! in slots `0..n` in order, remote boards are reachable only by locator.
//! Every driver call is recorded so tests can assert what the registry and
//! resolver actually did.
//!
//! # Example
//!
//! ```rust,ignore
//! use bscan::device::mock::{DriverOp, MockBoard, MockDriver};
//! use bscan::device::DeviceDriver;
//!
//! let driver = MockDriver::new(vec![MockBoard::new(0x1051_8400, "kona4", "1T000123")]);
//! let handle = driver.open_at_index(0).unwrap();
//!
//! driver.assert_operations(&[DriverOp::OpenIndex { index: 0 }]);
//! ```
//!
//! Inventories can also be described in a TOML bench file:
//!
//! ```toml
//! [[boards]]
//! family = 0x10518400
//! model = "kona4"
//! serial = "1T0001234"
//! features = ["can_do_4k_video"]
//! [boards.counts]
//! num_video_inputs = 4
//!
//! [[remote]]
//! family = 0x10538200
//! model = "io4k"
//! serial = "2T0005678"
//! host = "10.0.0.7:5555"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::form_urlencoded;

use super::info::{Count, FamilyId, Feature, SerialNumber};
use super::{DeviceDriver, DeviceHandle, VIRTUAL_SCHEME};
use crate::error::{Result, ResultExt, ScanError};
use crate::ident::{Identifier, classify};

/// Recorded driver call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOp {
    OpenIndex { index: u32 },
    OpenLocator { locator: String },
    ReadSerialString { index: u32 },
    Close { index: u32 },
}

/// One simulated board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockBoard {
    /// Raw family register; `0` and `0xFFFFFFFF` read as "not found".
    pub family: u32,
    pub model: String,
    /// Name reported when the board has a microphone input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_model: Option<String>,
    /// Printed serial string. The 64-bit register packs its first eight
    /// characters unless `serial_register` overrides it.
    pub serial: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_register: Option<u64>,
    #[serde(default)]
    pub features: BTreeSet<Feature>,
    #[serde(default)]
    pub counts: BTreeMap<Count, u32>,
    #[serde(default)]
    pub audio_control: u32,
    #[serde(default)]
    pub pci_slot: u32,
    /// Network address; only meaningful for remote boards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl MockBoard {
    /// Create a board with no capabilities.
    #[must_use]
    pub fn new(family: u32, model: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            family,
            model: model.into(),
            variant_model: None,
            serial: serial.into(),
            serial_register: None,
            features: BTreeSet::new(),
            counts: BTreeMap::new(),
            audio_control: 0,
            pci_slot: 0,
            host: None,
        }
    }

    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: Count, value: u32) -> Self {
        self.counts.insert(count, value);
        self
    }

    #[must_use]
    pub fn with_variant_model(mut self, name: impl Into<String>) -> Self {
        self.variant_model = Some(name.into());
        self
    }

    #[must_use]
    pub const fn with_audio_control(mut self, value: u32) -> Self {
        self.audio_control = value;
        self
    }

    #[must_use]
    pub const fn with_pci_slot(mut self, slot: u32) -> Self {
        self.pci_slot = slot;
        self
    }

    #[must_use]
    pub const fn with_serial_register(mut self, raw: u64) -> Self {
        self.serial_register = Some(raw);
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Value of the 64-bit serial register.
    #[must_use]
    pub fn serial_number(&self) -> Option<SerialNumber> {
        if let Some(raw) = self.serial_register {
            return SerialNumber::new(raw);
        }
        let packed = self.serial.get(..8).unwrap_or(&self.serial);
        SerialNumber::from_ascii(packed)
    }
}

/// Board inventory as read from a bench file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockBench {
    #[serde(default)]
    pub boards: Vec<MockBoard>,
    #[serde(default)]
    pub remote: Vec<MockBoard>,
}

impl MockBench {
    /// Parse a bench description.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` if the TOML is invalid or a board is missing
    /// a required field.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ScanError::ConfigParse(e.to_string()))
    }

    /// Read and parse a bench file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading bench file {}", path.display()))?;
        let bench = Self::from_toml(&content)?;
        debug!(
            path = %path.display(),
            local = bench.boards.len(),
            remote = bench.remote.len(),
            "Loaded bench"
        );
        Ok(bench)
    }

    #[must_use]
    pub fn into_driver(self) -> MockDriver {
        MockDriver::new(self.boards).with_remote(self.remote)
    }
}

#[derive(Default)]
struct MockState {
    boards: Mutex<Vec<MockBoard>>,
    remote: Mutex<Vec<MockBoard>>,
    operation_log: Mutex<Vec<DriverOp>>,
    open_delay: Mutex<Option<Duration>>,
    open_handles: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated driver.
///
/// Clones share the same inventory and operation log, so a test can keep
/// one clone to hot-plug boards while a registry owns another.
#[derive(Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    /// Create a driver with the given local boards in slot order.
    #[must_use]
    pub fn new(boards: Vec<MockBoard>) -> Self {
        debug!(count = boards.len(), "Creating mock driver");
        let driver = Self::default();
        *lock(&driver.state.boards) = boards;
        driver
    }

    /// Add boards reachable only by locator.
    #[must_use]
    pub fn with_remote(self, boards: Vec<MockBoard>) -> Self {
        *lock(&self.state.remote) = boards;
        self
    }

    /// Sleep this long in every slot open.
    #[must_use]
    pub fn with_open_delay(self, delay: Duration) -> Self {
        *lock(&self.state.open_delay) = Some(delay);
        self
    }

    // === Inventory ===

    /// Attach a board in the next free slot.
    pub fn hot_plug(&self, board: MockBoard) {
        debug!(model = %board.model, "Hot-plugging board");
        lock(&self.state.boards).push(board);
    }

    /// Detach the board in `slot`. Later boards shift down one slot.
    pub fn unplug(&self, slot: u32) -> Option<MockBoard> {
        let mut boards = lock(&self.state.boards);
        let slot = usize::try_from(slot).ok()?;
        (slot < boards.len()).then(|| boards.remove(slot))
    }

    #[must_use]
    pub fn board_count(&self) -> usize {
        lock(&self.state.boards).len()
    }

    // === Assertions ===

    /// Every driver call made so far.
    #[must_use]
    pub fn operations(&self) -> Vec<DriverOp> {
        lock(&self.state.operation_log).clone()
    }

    pub fn clear_operations(&self) {
        lock(&self.state.operation_log).clear();
    }

    /// Number of `open_at_index` calls.
    #[must_use]
    pub fn open_count(&self) -> usize {
        lock(&self.state.operation_log)
            .iter()
            .filter(|op| matches!(op, DriverOp::OpenIndex { .. }))
            .count()
    }

    /// Handles opened and not yet closed.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.state.open_handles.load(Ordering::SeqCst)
    }

    /// Panics unless the operation log equals `expected`.
    #[allow(clippy::missing_panics_doc)]
    pub fn assert_operations(&self, expected: &[DriverOp]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "driver operations mismatch\n  actual:   {actual:?}\n  expected: {expected:?}"
        );
    }

    /// Panics unless `op` was recorded at least once.
    #[allow(clippy::missing_panics_doc)]
    pub fn assert_operation_recorded(&self, op: &DriverOp) {
        let actual = self.operations();
        assert!(actual.contains(op), "{op:?} not in {actual:?}");
    }

    // === Internals ===

    fn record(&self, op: DriverOp) {
        trace!(?op, "Mock driver call");
        lock(&self.state.operation_log).push(op);
    }

    fn handle(&self, board: MockBoard, index: u32) -> MockHandle {
        self.state.open_handles.fetch_add(1, Ordering::SeqCst);
        MockHandle {
            board,
            index,
            open: true,
            state: Arc::clone(&self.state),
        }
    }

    fn open_slot(&self, slot: u32) -> Result<MockHandle> {
        let board = usize::try_from(slot)
            .ok()
            .and_then(|i| lock(&self.state.boards).get(i).cloned());
        board
            .map(|board| self.handle(board, slot))
            .ok_or(ScanError::SlotUnavailable { slot })
    }

    /// First local-then-remote board matching `pred`, with its index.
    fn find(&self, pred: impl Fn(&MockBoard) -> bool) -> Option<(MockBoard, u32)> {
        let search = |boards: &[MockBoard]| {
            boards
                .iter()
                .zip(0u32..)
                .find(|(board, _)| pred(board))
                .map(|(board, i)| (board.clone(), i))
        };
        let local = search(&lock(&self.state.boards));
        local.or_else(|| search(&lock(&self.state.remote)))
    }
}

/// Decoded value of `key` in the locator's query string.
fn query_param(locator: &str, key: &str) -> Option<String> {
    let (_, query) = locator.split_once('?')?;
    form_urlencoded::parse(query.as_bytes()).find_map(|(k, v)| (k == key).then(|| v.into_owned()))
}

impl DeviceDriver for MockDriver {
    type Handle = MockHandle;

    fn open_at_index(&self, index: u32) -> Result<MockHandle> {
        self.record(DriverOp::OpenIndex { index });
        let delay = *lock(&self.state.open_delay);
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        self.open_slot(index)
    }

    fn open_at_locator(&self, locator: &str) -> Result<MockHandle> {
        self.record(DriverOp::OpenLocator {
            locator: locator.to_string(),
        });

        let found = match classify(locator) {
            Identifier::Empty => None,
            Identifier::Index(slot) => return self.open_slot(slot),
            Identifier::HexSerial(sn) => self.find(|b| b.serial_number() == Some(sn)),
            Identifier::SerialString(text) => {
                self.find(|b| b.serial.eq_ignore_ascii_case(&text))
            }
            Identifier::Locator(text) if text.starts_with(VIRTUAL_SCHEME) => {
                query_param(&text, "serial").and_then(|sn| {
                    self.find(|b| {
                        b.serial_number().and_then(SerialNumber::to_ascii).as_deref() == Some(sn.as_str())
                    })
                })
            }
            Identifier::Locator(text) => self.find(|b| b.host.as_deref() == Some(text.as_str())),
            Identifier::Text(text) => self.find(|b| b.model.eq_ignore_ascii_case(&text)),
        };

        found
            .map(|(board, index)| self.handle(board, index))
            .ok_or_else(|| ScanError::DeviceOpenFailed {
                locator: locator.to_string(),
                reason: "nothing answers at this locator".to_string(),
            })
    }

    fn family_name(&self, family: FamilyId, variant: bool) -> Option<String> {
        let (board, _) = self.find(|b| b.family == family.raw())?;
        if variant {
            if let Some(name) = board.variant_model {
                return Some(name);
            }
        }
        Some(board.model)
    }
}

/// Open handle onto a [`MockBoard`].
///
/// The board is copied at open time; later inventory changes do not affect
/// an already open handle.
pub struct MockHandle {
    board: MockBoard,
    index: u32,
    open: bool,
    state: Arc<MockState>,
}

impl MockHandle {
    /// Board this handle was opened on.
    #[must_use]
    pub const fn board(&self) -> &MockBoard {
        &self.board
    }
}

impl std::fmt::Debug for MockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHandle")
            .field("model", &self.board.model)
            .field("index", &self.index)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

impl DeviceHandle for MockHandle {
    fn is_open(&self) -> bool {
        self.open
    }

    fn index_number(&self) -> u32 {
        self.index
    }

    fn family_id(&self) -> Option<FamilyId> {
        FamilyId::from_raw(self.board.family)
    }

    fn serial_number(&self) -> Option<SerialNumber> {
        self.board.serial_number()
    }

    fn serial_number_string(&self) -> Option<String> {
        lock(&self.state.operation_log).push(DriverOp::ReadSerialString { index: self.index });
        let serial = self.board.serial.trim();
        (self.open && !serial.is_empty()).then(|| serial.to_string())
    }

    fn is_supported(&self, feature: Feature) -> bool {
        self.open && self.board.features.contains(&feature)
    }

    fn num_supported(&self, count: Count) -> u32 {
        if !self.open {
            return 0;
        }
        self.board.counts.get(&count).copied().unwrap_or(0)
    }

    fn audio_control(&self) -> u32 {
        self.board.audio_control
    }

    fn pci_slot(&self) -> u32 {
        self.board.pci_slot
    }

    fn host_name(&self) -> Option<String> {
        self.board.host.clone()
    }

    fn is_remote(&self) -> bool {
        self.board.host.is_some()
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.state.open_handles.fetch_sub(1, Ordering::SeqCst);
            lock(&self.state.operation_log).push(DriverOp::Close { index: self.index });
        }
    }
}
