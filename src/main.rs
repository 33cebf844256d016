//! bscan - enumerate capture boards and select one by index, name, serial
//! or locator.
//!
//! Provides both human-friendly and robot-mode (JSON) interfaces.
#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use tracing::{debug, info};

use bscan::cli::{self, Cli, Commands};
use bscan::config::{PathResolver, ScannerConfig};
use bscan::device::mock::{MockBench, MockDriver};
use bscan::device::{DeviceDriver, DeviceHandle, DeviceSnapshot, FamilyId};
use bscan::diff::compare_device_lists_by_serial;
use bscan::error::{Result, ScanError};
use bscan::ident::parse_hex_serial;
use bscan::logging::init_logging;
use bscan::output::{DeviceListing, Output, OutputMode, Selection, WatchEvent};
use bscan::registry::DeviceRegistry;
use bscan::resolver::{Resolver, is_listing_request, write_device_table};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }
}

/// Exit status when no device was selected.
const EXIT_NOT_FOUND: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let output = OutputMode::from_cli(&cli).into_output();

    if let Err(e) = run(&cli, output.as_ref()) {
        // The table was the whole answer; nothing else to report.
        if !matches!(e, ScanError::ListingOnly) {
            output.error(&e);
        }
        std::process::exit(if e.is_not_found() { EXIT_NOT_FOUND } else { 1 });
    }
}

fn run(cli: &Cli, output: &dyn Output) -> Result<()> {
    match &cli.command {
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
        Some(Commands::List(args)) => cmd_list(cli, output, args),
        Some(Commands::Select(args)) => cmd_select(cli, output, args),
        Some(Commands::Find(args)) => cmd_find(cli, output, args),
        Some(Commands::Info(args)) => cmd_info(cli, output, args),
        Some(Commands::Watch(args)) => cmd_watch(cli, output, args),
        Some(Commands::Config(args)) => cmd_config(cli, output, args),
        Some(Commands::Version) => {
            output.version_info(
                build_info::VERSION,
                Some(build_info::git_sha()),
                Some(build_info::build_timestamp()),
            );
            Ok(())
        }
        Some(Commands::Completions(args)) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "bscan", &mut io::stdout());
            Ok(())
        }
    }
}

// === Setup ===

/// Settings file merged with command-line overrides, plus the file it
/// came from.
fn load_config(cli: &Cli) -> Result<(ScannerConfig, Option<PathBuf>)> {
    let (mut config, path) = match &cli.config {
        Some(path) => (ScannerConfig::load_from(path)?, Some(path.clone())),
        None => (
            ScannerConfig::load()?,
            ScannerConfig::default_path().filter(|p| p.exists()),
        ),
    };

    let cwd = PathResolver::from_cwd();
    if let Some(bench) = &cli.bench {
        config.driver.bench = Some(cwd.resolve(bench)?);
    }
    if let Some(map) = &cli.virtual_map {
        config.virtual_devices.map_path = Some(cwd.resolve(map)?);
    }
    debug!(?config, "Effective configuration");
    Ok((config, path))
}

fn open_registry(cli: &Cli) -> Result<DeviceRegistry<MockDriver>> {
    let (config, _) = load_config(cli)?;
    let bench = config.driver.bench.as_ref().ok_or(ScanError::NoDriver)?;
    let driver = MockBench::load(bench)?.into_driver();
    Ok(DeviceRegistry::new(driver).with_virtual_devices(config.virtual_source()))
}

fn selection<D: DeviceDriver>(
    resolver: &Resolver<'_, D>,
    criterion: String,
    handle: &D::Handle,
) -> Selection {
    Selection {
        criterion,
        ref_name: resolver.ref_name(handle),
        description: resolver.describe(handle),
        index: handle.index_number(),
        remote: handle.is_remote(),
    }
}

fn parse_family_id(text: &str) -> Result<FamilyId> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(FamilyId::from_raw)
        .ok_or_else(|| {
            ScanError::malformed(text, "family id must be a non-zero 32-bit hex value")
        })
}

// === Command Implementations ===

/// Rescan and render the device table.
fn scan_listing(registry: &DeviceRegistry<MockDriver>) -> Result<DeviceListing> {
    let report = registry.scan_hardware();
    let devices = registry.device_list();

    let mut table: Vec<u8> = Vec::new();
    write_device_table(registry.driver(), &devices, &mut table)?;

    Ok(DeviceListing {
        report,
        devices,
        table: String::from_utf8_lossy(&table).into_owned(),
    })
}

/// `LIST` / `?` given where a device argument was expected: show the table
/// through `output` and select nothing.
fn listing_only(registry: &DeviceRegistry<MockDriver>, output: &dyn Output) -> Result<()> {
    output.device_list(&scan_listing(registry)?, false);
    Err(ScanError::ListingOnly)
}

fn cmd_list(cli: &Cli, output: &dyn Output, args: &cli::ListArgs) -> Result<()> {
    let registry = open_registry(cli)?;
    output.device_list(&scan_listing(&registry)?, args.long);
    Ok(())
}

fn cmd_select(cli: &Cli, output: &dyn Output, args: &cli::SelectArgs) -> Result<()> {
    let registry = open_registry(cli)?;
    if is_listing_request(&args.argument) {
        return listing_only(&registry, output);
    }
    let resolver = Resolver::new(&registry);

    let mut handle = resolver.from_argument(&args.argument)?;
    output.device_selected(&selection(&resolver, args.argument.clone(), &handle));
    handle.close();
    Ok(())
}

fn cmd_find(cli: &Cli, output: &dyn Output, args: &cli::FindArgs) -> Result<()> {
    let registry = open_registry(cli)?;
    let resolver = Resolver::new(&registry);

    let (criterion, result) = if let Some(index) = args.index {
        (format!("index {index}"), resolver.by_index(index))
    } else if let Some(id) = &args.id {
        (format!("id {id}"), resolver.by_family_id(parse_family_id(id)?))
    } else if let Some(name) = &args.name {
        (format!("name {name}"), resolver.by_name(name))
    } else if let Some(serial) = &args.serial {
        (format!("serial {serial}"), resolver.by_serial_string(serial))
    } else if let Some(text) = &args.serial_number {
        let serial = parse_hex_serial(text)
            .ok_or_else(|| {
                ScanError::malformed(text, "serial number must be 1-16 hex digits, not zero")
            })?;
        (format!("serial number {serial}"), resolver.by_serial_number(serial))
    } else {
        return Err(ScanError::Other("No search criterion given".to_string()));
    };

    let mut handle = result?;
    output.device_selected(&selection(&resolver, criterion, &handle));
    handle.close();
    Ok(())
}

fn cmd_info(cli: &Cli, output: &dyn Output, args: &cli::InfoArgs) -> Result<()> {
    let registry = open_registry(cli)?;
    if is_listing_request(&args.argument) {
        return listing_only(&registry, output);
    }
    let resolver = Resolver::new(&registry);

    let mut handle = resolver.from_argument(&args.argument)?;
    let snapshot = DeviceSnapshot::capture(registry.driver(), &handle, handle.index_number());
    output.device_info(
        &selection(&resolver, args.argument.clone(), &handle),
        snapshot.as_ref(),
    );
    handle.close();
    Ok(())
}

fn cmd_watch(cli: &Cli, output: &dyn Output, args: &cli::WatchArgs) -> Result<()> {
    let registry = open_registry(cli)?;
    let interval = Duration::from_millis(args.interval_ms);
    info!(interval_ms = args.interval_ms, count = args.count, "Watching for board changes");

    let mut previous = Vec::new();
    for scan in 1u64.. {
        let report = registry.scan_hardware();
        let current = registry.device_list();
        let diff = compare_device_lists_by_serial(&previous, &current);

        if scan == 1 || diff.has_changes() {
            output.watch_event(&WatchEvent { scan, report, diff });
        }
        previous = current;

        if args.count != 0 && scan >= args.count {
            break;
        }
        thread::sleep(interval);
    }
    Ok(())
}

fn cmd_config(cli: &Cli, output: &dyn Output, args: &cli::ConfigArgs) -> Result<()> {
    if args.path {
        match cli.config.clone().or_else(ScannerConfig::default_path) {
            Some(path) => println!("{}", path.display()),
            None => println!("(none)"),
        }
        return Ok(());
    }
    let (config, path) = load_config(cli)?;
    output.config_info(path.as_deref(), &config);
    Ok(())
}
