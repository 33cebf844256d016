//! Common test utilities for the board scanner.
//!
//! - `capture`: stdout capture for code that prints the device table
//! - `env`: serialized environment variable overrides
//! - `fixtures`: temporary bench, map and config files
#![allow(dead_code)]

pub mod capture;
pub mod env;
pub mod fixtures;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
