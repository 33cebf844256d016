//! Output capture utilities for tests.
#![allow(dead_code)]

use std::io::{Read, Write};

use gag::BufferRedirect;
use tracing::{debug, instrument, trace};

#[instrument(skip(func))]
pub fn capture_stdout<T, F: FnOnce() -> T>(func: F) -> (T, String) {
    trace!("Capturing stdout");
    let mut redirect = BufferRedirect::stdout().expect("failed to redirect stdout");
    let value = func();
    let _ = std::io::stdout().flush();
    let mut output = String::new();
    redirect
        .read_to_string(&mut output)
        .expect("failed to read stdout buffer");
    debug!(len = output.len(), "Captured stdout");
    (value, output)
}
