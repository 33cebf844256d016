//! Environment variable helpers for tests.
#![allow(dead_code)]

use std::path::Path;

use env_lock::{EnvGuard as LockedEnvGuard, lock_env};
use tracing::{instrument, trace};

/// RAII guard to restore environment variables on drop.
pub struct EnvGuard<'a> {
    _guard: LockedEnvGuard<'a>,
}

impl<'a> EnvGuard<'a> {
    #[must_use]
    #[instrument]
    pub fn set(key: &'a str, value: &str) -> Self {
        trace!(key, value, "Setting env var");
        let guard = lock_env([(key, Some(value))]);
        Self { _guard: guard }
    }

    #[must_use]
    #[instrument]
    pub fn remove(key: &'a str) -> Self {
        trace!(key, "Removing env var");
        let guard = lock_env([(key, None::<&str>)]);
        Self { _guard: guard }
    }
}

/// Point `BSCAN_CONFIG` at `path` for the guard's lifetime.
#[must_use]
pub fn with_config_file(path: &Path) -> EnvGuard<'static> {
    EnvGuard::set("BSCAN_CONFIG", &path.to_string_lossy())
}

#[must_use]
pub fn without_config_file() -> EnvGuard<'static> {
    EnvGuard::remove("BSCAN_CONFIG")
}
