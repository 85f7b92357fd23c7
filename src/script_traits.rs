//! Type-safe script argument contracts.
//!
//! The archive ships shell scripts with positional interfaces. Rust structs
//! implement [`ScriptArgs`] so the argument order lives in one place and a
//! swapped pair is a compile-time field mismatch instead of a wiped disk.

use std::path::PathBuf;

use crate::artifacts;

/// Trait for typed script arguments.
///
/// # Contract
///
/// - `to_cli_args()`: Returns arguments exactly as the script expects them.
/// - `script_name()`: Returns the script filename, relative to the work dir.
/// - `requires_root()`: Whether the script must run with elevated privileges.
pub trait ScriptArgs {
    /// Convert struct fields to CLI arguments.
    fn to_cli_args(&self) -> Vec<String>;

    /// Get the script filename.
    fn script_name(&self) -> &'static str;

    /// Whether the script needs root.
    fn requires_root(&self) -> bool {
        false
    }
}

/// Arguments for `bootable-usb-prepare.sh <disk> <bundle> <config>`.
///
/// The disk path is taken verbatim from the operator; the script is the one
/// that decides whether it names a real block device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootableUsbArgs {
    /// Target disk, e.g. `/dev/sdb`
    pub disk: String,
    /// Image bundle, relative to the work dir
    pub bundle: PathBuf,
    /// Answers file, relative to the work dir
    pub config: PathBuf,
}

impl BootableUsbArgs {
    /// Arguments using the bundle and config file shipped in the archive
    pub fn for_disk(disk: impl Into<String>) -> Self {
        Self {
            disk: disk.into(),
            bundle: PathBuf::from(artifacts::USB_BUNDLE),
            config: PathBuf::from(artifacts::CONFIG_FILE),
        }
    }
}

impl ScriptArgs for BootableUsbArgs {
    fn to_cli_args(&self) -> Vec<String> {
        vec![
            self.disk.clone(),
            self.bundle.to_string_lossy().into_owned(),
            self.config.to_string_lossy().into_owned(),
        ]
    }

    fn script_name(&self) -> &'static str {
        artifacts::USB_PREPARE_SCRIPT
    }

    fn requires_root(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootable_usb_args_order() {
        let args = BootableUsbArgs::for_disk("/dev/sdb");
        assert_eq!(
            args.to_cli_args(),
            vec!["/dev/sdb", "usb-bootable-files.tar.gz", "config-file"]
        );
        assert_eq!(args.script_name(), "bootable-usb-prepare.sh");
        assert!(args.requires_root());
    }

    #[test]
    fn test_disk_is_passed_verbatim() {
        let args = BootableUsbArgs::for_disk("not a device");
        assert_eq!(args.to_cli_args()[0], "not a device");
    }
}
