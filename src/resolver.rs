//! Turning user-supplied criteria into an open device.
//!
//! Every lookup except the raw-locator fallback rescans first and opens the
//! chosen board while the registry lock is still held, so the match and
//! the open see the same device list.

use std::io::{self, Write};

use tracing::{debug, instrument, trace};
use url::form_urlencoded;

use crate::device::{
    DeviceDriver, DeviceHandle, DeviceSnapshot, FamilyId, SerialNumber, VIRTUAL_SCHEME,
};
use crate::error::{Result, ScanError};
use crate::ident::is_alpha_numeric;
use crate::registry::{DeviceRegistry, VirtualDeviceSource};

/// Names older tools used for boards that have since been renamed.
const LEGACY_NAME_ALIASES: &[(&str, &str)] = &[("io4kplus", "avid dnxiv")];

/// Placeholder the family-name table uses for unknown families.
const UNKNOWN_FAMILY: &str = "???";

fn not_found(criterion: impl Into<String>) -> ScanError {
    ScanError::DeviceNotFound {
        criterion: criterion.into(),
    }
}

fn open_slot<D: DeviceDriver>(driver: &D, snapshot: &DeviceSnapshot) -> Result<D::Handle> {
    debug!(index = snapshot.index, name = %snapshot.display_name, "Opening matched board");
    driver
        .open_at_index(snapshot.index)
        .map_err(|e| ScanError::DeviceOpenFailed {
            locator: snapshot.index.to_string(),
            reason: e.to_string(),
        })
}

fn family_label<D: DeviceDriver>(driver: &D, family: Option<FamilyId>) -> String {
    family
        .and_then(|id| driver.family_name(id, false))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_FAMILY.to_string())
}

/// True for the `LIST` and `?` pseudo-arguments, which print the device
/// table instead of selecting a board.
pub fn is_listing_request(argument: &str) -> bool {
    argument.eq_ignore_ascii_case("list") || argument == "?"
}

/// Locator the driver uses to open a virtual device. Query values are
/// form-urlencoded.
pub fn virtual_locator(source: &VirtualDeviceSource, serial: &str, id: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("config", &source.map_path().to_string_lossy())
        .append_pair("serial", serial)
        .append_pair("vdid", id)
        .finish();
    format!("{VIRTUAL_SCHEME}localhost/?{query}")
}

/// Write the enumeration table for `devices`.
///
/// ```text
/// 2 available devices:
/// 00 |    kona4 |  1T000123 | 0x3154303030313233
/// 01 |     io4k
/// *** Virtual Devices ***
/// 100 |        Studio A | vd-a (kona4 1T000123)
/// ```
pub fn write_device_table<D: DeviceDriver>(
    driver: &D,
    devices: &[DeviceSnapshot],
    out: &mut impl Write,
) -> io::Result<()> {
    match devices.len() {
        0 => writeln!(out, "No devices detected")?,
        1 => writeln!(out, "1 available device:")?,
        n => writeln!(out, "{n} available devices:")?,
    }

    let (virtuals, locals): (Vec<_>, Vec<_>) = devices.iter().partition(|d| d.is_virtual());

    for device in locals {
        write!(out, "{:02} | {:>8}", device.index, family_label(driver, device.family_id))?;
        if let Some(sn) = device.serial_number {
            if let Some(text) = sn.to_ascii() {
                write!(out, " | {text:>9} | 0x{:08x}", sn.get())?;
            }
        }
        writeln!(out)?;
    }

    if !virtuals.is_empty() {
        writeln!(out, "*** Virtual Devices ***")?;
        for device in virtuals {
            let Some(vd) = &device.virtual_device else {
                continue;
            };
            write!(
                out,
                "{:02} | {:>15} | {} ({}",
                device.index,
                vd.name,
                vd.id,
                family_label(driver, device.family_id)
            )?;
            if let Some(serial) = device.serial_string() {
                write!(out, " {serial}")?;
            }
            writeln!(out, ")")?;
        }
    }
    Ok(())
}

/// Device lookups over one registry.
pub struct Resolver<'r, D: DeviceDriver> {
    registry: &'r DeviceRegistry<D>,
}

impl<'r, D: DeviceDriver> Resolver<'r, D> {
    pub const fn new(registry: &'r DeviceRegistry<D>) -> Self {
        Self { registry }
    }

    /// Open local slot `index`.
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` if `index` is not below the number of local boards.
    #[instrument(skip(self))]
    pub fn by_index(&self, index: u32) -> Result<D::Handle> {
        self.registry.with_rescanned(|driver, devices| {
            let local = devices.iter().filter(|d| !d.is_virtual()).count();
            if usize::try_from(index).map_or(true, |i| i >= local) {
                debug!(index, local, "Index out of range");
                return Err(not_found(format!("index {index}")));
            }
            driver
                .open_at_index(index)
                .map_err(|e| ScanError::DeviceOpenFailed {
                    locator: index.to_string(),
                    reason: e.to_string(),
                })
        })
    }

    /// Open the first local board of the given family.
    #[instrument(skip(self))]
    pub fn by_family_id(&self, family: FamilyId) -> Result<D::Handle> {
        self.registry.with_rescanned(|driver, devices| {
            devices
                .iter()
                .filter(|d| !d.is_virtual())
                .find(|d| d.family_id == Some(family))
                .ok_or_else(|| not_found(format!("family {family}")))
                .and_then(|d| open_slot(driver, d))
        })
    }

    /// Open the first local board whose display name contains `name`,
    /// ignoring case.
    ///
    /// A name with non-alphanumeric characters is only accepted if it
    /// contains `:`; it is then opened directly as a locator.
    #[instrument(skip(self))]
    pub fn by_name(&self, name: &str) -> Result<D::Handle> {
        if name.is_empty() {
            return Err(ScanError::malformed(name, "name is empty"));
        }
        if !is_alpha_numeric(name) {
            if name.contains(':') {
                debug!(locator = name, "Opening name as locator");
                return self.registry.driver().open_at_locator(name);
            }
            return Err(ScanError::malformed(
                name,
                "name must be alphanumeric or a host:port locator",
            ));
        }

        let wanted = name.to_lowercase();
        self.registry.with_rescanned(|driver, devices| {
            let find = |needle: &str| {
                devices
                    .iter()
                    .filter(|d| !d.is_virtual())
                    .find(|d| d.display_name.to_lowercase().contains(needle))
            };

            let hit = find(&wanted).or_else(|| {
                LEGACY_NAME_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == wanted)
                    .and_then(|(_, current)| {
                        trace!(alias = %wanted, current = *current, "Trying legacy name");
                        find(*current)
                    })
            });

            hit.ok_or_else(|| not_found(format!("name '{name}'")))
                .and_then(|d| open_slot(driver, d))
        })
    }

    /// Open the first local board whose live serial string contains
    /// `serial`, ignoring case.
    ///
    /// Each candidate is opened to read its serial; handles that do not
    /// match are closed again.
    #[instrument(skip(self))]
    pub fn by_serial_string(&self, serial: &str) -> Result<D::Handle> {
        if serial.is_empty() {
            return Err(ScanError::malformed(serial, "serial is empty"));
        }
        let wanted = serial.to_lowercase();

        self.registry.with_rescanned(|driver, devices| {
            for device in devices.iter().filter(|d| !d.is_virtual()) {
                let mut handle = match driver.open_at_index(device.index) {
                    Ok(handle) => handle,
                    Err(e) => {
                        debug!(index = device.index, error = %e, "Candidate did not open");
                        continue;
                    }
                };
                let live = handle.serial_number_string().unwrap_or_default();
                if live.to_lowercase().contains(&wanted) {
                    debug!(index = device.index, serial = %live, "Serial matched");
                    return Ok(handle);
                }
                handle.close();
            }
            Err(not_found(format!("serial '{serial}'")))
        })
    }

    /// Open the first local board whose 64-bit serial equals `serial`.
    #[instrument(skip_all, fields(serial = %serial))]
    pub fn by_serial_number(&self, serial: SerialNumber) -> Result<D::Handle> {
        self.registry.with_rescanned(|driver, devices| {
            devices
                .iter()
                .filter(|d| !d.is_virtual())
                .find(|d| d.serial_number == Some(serial))
                .ok_or_else(|| not_found(format!("serial number {serial}")))
                .and_then(|d| open_slot(driver, d))
        })
    }

    /// General-purpose resolution of a command-line argument. `LIST` and
    /// `?` print the device table to stdout.
    pub fn from_argument(&self, argument: &str) -> Result<D::Handle> {
        self.from_argument_to(argument, &mut io::stdout().lock())
    }

    /// [`from_argument`](Self::from_argument) writing any table to `out`.
    ///
    /// # Errors
    ///
    /// `ListingOnly` after printing the table for `LIST`/`?`;
    /// `MalformedIdentifier` for an empty argument; otherwise whatever the
    /// driver reports for the locator.
    #[instrument(skip(self, out))]
    pub fn from_argument_to(&self, argument: &str, out: &mut impl Write) -> Result<D::Handle> {
        if argument.is_empty() {
            return Err(ScanError::malformed(argument, "argument is empty"));
        }

        if is_listing_request(argument) {
            self.registry
                .with_rescanned(|driver, devices| write_device_table(driver, devices, out))?;
            return Err(ScanError::ListingOnly);
        }

        if let Some(source) = self.registry.virtual_source() {
            let virtual_hit = self.registry.with_rescanned(|driver, devices| {
                let device = devices.iter().find(|d| {
                    d.virtual_device.as_ref().is_some_and(|vd| {
                        d.index.to_string() == argument || vd.name == argument || vd.id == argument
                    })
                })?;
                let vd = device.virtual_device.as_ref()?;
                let serial = device.serial_string().unwrap_or_default();
                let locator = virtual_locator(source, &serial, &vd.id);
                debug!(%locator, "Opening virtual device");
                Some(driver.open_at_locator(&locator))
            });
            if let Some(result) = virtual_hit {
                return result;
            }
        }

        trace!(argument, "Opening argument as locator");
        self.registry.driver().open_at_locator(argument)
    }

    /// Name that [`from_argument`](Self::from_argument) maps back to the
    /// same board. Empty if the handle is closed.
    ///
    /// Preference order: remote host, serial string, family name, index.
    pub fn ref_name(&self, handle: &D::Handle) -> String {
        if !handle.is_open() {
            return String::new();
        }
        if handle.is_remote() {
            if let Some(host) = handle.host_name().filter(|h| !h.is_empty()) {
                return host;
            }
        }
        if let Some(serial) = handle.serial_number_string().filter(|s| !s.is_empty()) {
            return serial;
        }
        let family = family_label(self.registry.driver(), handle.family_id());
        if family != UNKNOWN_FAMILY {
            return family;
        }
        handle.index_number().to_string()
    }

    /// One-line description: `<model> '<serial>' on '<host>' at index N`.
    pub fn describe(&self, handle: &D::Handle) -> String {
        let model = family_label(self.registry.driver(), handle.family_id());
        let serial = handle.serial_number_string().unwrap_or_default();
        let host = handle
            .host_name()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());
        format!(
            "{model} '{serial}' on '{host}' at index {}",
            handle.index_number()
        )
    }
}
