//! Pre-flight sanity checks for runtime environment
//!
//! Verifies the host tools the workflow shells out to are on PATH. A missing
//! tool is reported up front, but the run still proceeds: the step that
//! needs it fails later with its own diagnostic.

use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;

use crate::theme;

/// Result of environment verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Returns true if every required binary was found
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty()
    }
}

/// Host binaries the workflow invokes
pub const REQUIRED_BINARIES: &[&str] = &[
    "tar",   // Archive extraction
    "lsblk", // Block device listing (util-linux)
    "sudo",  // Elevation for the USB preparation script
];

/// Check if an executable named `name` is on PATH
fn binary_exists(name: &str) -> bool {
    let Some(path) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path).any(|dir| {
        fs::metadata(dir.join(name))
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    })
}

/// Perform all sanity checks and return the result
pub fn verify_environment() -> SanityCheckResult {
    let is_root = nix::unistd::geteuid().is_root();
    let missing_binaries = REQUIRED_BINARIES
        .iter()
        // sudo is never invoked when already root
        .filter(|binary| !(is_root && **binary == "sudo"))
        .filter(|binary| !binary_exists(binary))
        .map(|binary| (*binary).to_string())
        .collect();

    SanityCheckResult {
        missing_binaries,
        is_root,
    }
}

/// Log and print a warning for each missing binary
pub fn report(result: &SanityCheckResult) {
    for binary in &result.missing_binaries {
        tracing::warn!("Required binary not found on PATH: {}", binary);
        theme::warning(&format!("'{}' was not found on PATH", binary));
    }
}
