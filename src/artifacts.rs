//! Installation artifact discovery
//!
//! Finds `sen-installation-files.tar.gz` under the work dir and checks that
//! extraction produced the files the preparation step needs.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{InstallError, Result};

/// Bundled archive the installer unpacks
pub const ARCHIVE_NAME: &str = "sen-installation-files.tar.gz";

/// Configuration placeholder shipped in the archive and overwritten with answers
pub const CONFIG_FILE: &str = "config-file";

/// Script that writes the bootable image to the target disk
pub const USB_PREPARE_SCRIPT: &str = "bootable-usb-prepare.sh";

/// Bundle handed to the preparation script
pub const USB_BUNDLE: &str = "usb-bootable-files.tar.gz";

/// Log collection helper shipped for field support
pub const LOGS_COLLECTION_SCRIPT: &str = "edgenode-logs-collection.sh";

/// Files that must be present in the work dir after extraction, checked in order
pub const REQUIRED_FILES: [&str; 4] = [
    CONFIG_FILE,
    USB_PREPARE_SCRIPT,
    USB_BUNDLE,
    LOGS_COLLECTION_SCRIPT,
];

/// Recursively search `root` for the installation archive.
///
/// The first match in directory traversal order wins. That order is whatever
/// the filesystem yields, so with duplicate archives the pick is unspecified.
/// Unreadable subdirectories are skipped.
pub fn locate_archive(root: &Path) -> Result<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry during archive search: {}", e);
                None
            }
        })
        .find(|entry| entry.file_type().is_file() && entry.file_name() == ARCHIVE_NAME)
        .map(walkdir::DirEntry::into_path)
        .ok_or_else(|| InstallError::ArtifactNotFound(ARCHIVE_NAME.to_string()))
}

/// Check the required files exist directly in `work_dir`.
///
/// Stops at the first missing name.
pub fn verify_required_files(work_dir: &Path) -> Result<()> {
    for name in REQUIRED_FILES {
        if work_dir.join(name).exists() {
            tracing::info!("{} is present in directory.", name);
        } else {
            tracing::error!("{} is not present in {}", name, work_dir.display());
            return Err(InstallError::MissingRequiredFile(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_locate_archive_at_root() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join(ARCHIVE_NAME));

        let found = locate_archive(dir.path()).unwrap();
        assert_eq!(found, dir.path().join(ARCHIVE_NAME));
    }

    #[test]
    fn test_locate_archive_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("media").join("bundle").join(ARCHIVE_NAME);
        touch(&nested);
        touch(&dir.path().join("media").join("other.tar.gz"));

        assert_eq!(locate_archive(dir.path()).unwrap(), nested);
    }

    #[test]
    fn test_locate_archive_ignores_directory_with_same_name() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(ARCHIVE_NAME)).unwrap();

        let err = locate_archive(dir.path()).unwrap_err();
        assert!(matches!(err, InstallError::ArtifactNotFound(_)));
    }

    #[test]
    fn test_locate_archive_missing() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("sen-installation-files.tar"));

        let err = locate_archive(dir.path()).unwrap_err();
        assert!(matches!(err, InstallError::ArtifactNotFound(name) if name == ARCHIVE_NAME));
    }

    #[test]
    fn test_verify_required_files_all_present() {
        let dir = TempDir::new().unwrap();
        for name in REQUIRED_FILES {
            touch(&dir.path().join(name));
        }
        assert!(verify_required_files(dir.path()).is_ok());
    }

    #[test]
    fn test_verify_required_files_reports_first_missing() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join(CONFIG_FILE));
        touch(&dir.path().join(USB_BUNDLE));

        let err = verify_required_files(dir.path()).unwrap_err();
        assert!(
            matches!(&err, InstallError::MissingRequiredFile(name) if name == USB_PREPARE_SCRIPT),
            "got {err:?}"
        );
    }

    #[test]
    fn test_verify_required_files_only_checks_work_dir() {
        let dir = TempDir::new().unwrap();
        for name in REQUIRED_FILES {
            touch(&dir.path().join("nested").join(name));
        }
        assert!(verify_required_files(dir.path()).is_err());
    }
}
