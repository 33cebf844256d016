//! CLI argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Board scanner - enumerate capture boards and pick one by index, name,
/// serial or locator.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "bscan", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "BSCAN_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR", value_parser = clap::builder::BoolishValueParser::new())]
    pub no_color: bool,

    /// Settings file (default: $BSCAN_CONFIG or <config dir>/bscan/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bench file describing simulated boards
    #[arg(long, global = true, value_name = "FILE", env = "BSCAN_BENCH")]
    pub bench: Option<PathBuf>,

    /// Virtual-device map (overrides [virtual_devices].map_path)
    #[arg(long, global = true, value_name = "FILE")]
    pub virtual_map: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Discovery ===
    /// Rescan and list attached boards
    List(ListArgs),

    /// Open a board the way tools resolve their device argument
    Select(SelectArgs),

    /// Open a board by one specific criterion
    Find(FindArgs),

    /// Show the full capability snapshot of a board
    Info(InfoArgs),

    /// Poll for boards appearing and disappearing
    Watch(WatchArgs),

    // === Configuration ===
    /// Show current configuration
    Config(ConfigArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Print every capability snapshot after the table
    #[arg(long, short = 'l')]
    pub long: bool,
}

#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Index, model name, serial, 0x-serial, host:port, virtual device, or LIST / ?
    pub argument: String,
}

/// Exactly one criterion must be given.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct FindArgs {
    /// Local slot index
    #[arg(long)]
    pub index: Option<u32>,

    /// Family id in hex (e.g. 0x10518400)
    #[arg(long, value_name = "HEX")]
    pub id: Option<String>,

    /// Case-insensitive substring of the display name
    #[arg(long)]
    pub name: Option<String>,

    /// Case-insensitive substring of the printed serial
    #[arg(long)]
    pub serial: Option<String>,

    /// 64-bit serial in hex
    #[arg(long, value_name = "HEX")]
    pub serial_number: Option<String>,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Device argument, resolved like `select`
    pub argument: String,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Delay between scans in milliseconds
    #[arg(long, default_value = "1000")]
    pub interval_ms: u64,

    /// Stop after this many scans (0 = run until interrupted)
    #[arg(long, short = 'n', default_value = "0")]
    pub count: u64,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Only print the configuration file path
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
