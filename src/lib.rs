//! Board scanner library - enumeration, identity matching and selection of
//! capture boards.
//!
//! This library exposes the core of the `bscan` CLI for use in tests and
//! by other tools that need to pick a board from a user-supplied argument.
//!
//! # Modules
//!
//! - `ident`: Classification of free-form device identifiers
//! - `device`: Driver seam, identity types and capability snapshots
//! - `registry`: The authoritative device list and rescans
//! - `resolver`: Criteria to open device handle
//! - `diff`: Differences between two device lists
//! - `config`: Settings file and virtual-device map
//! - `error`: Error types with user-recoverable hints
//! - `output`: Output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod device;
pub mod diff;
pub mod error;
pub mod ident;
pub mod logging;
pub mod output;
pub mod registry;
pub mod resolver;
