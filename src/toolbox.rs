//! External tools the installer drives
//!
//! The installer never implements extraction, disk enumeration or image
//! writing itself. It calls out to `tar`, `lsblk` and the bundled
//! `bootable-usb-prepare.sh` through the [`Toolbox`] trait, which keeps the
//! workflow testable without root or real disks.

use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;

use crate::script_runner::{self, ScriptOutput, run_captured, run_script_safe};
use crate::script_traits::BootableUsbArgs;

/// Collected result of a non-interactive tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Command line that was run
    pub command: String,
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
    /// Whether the tool exited with status 0
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    fn from_output(command: String, output: Output) -> Self {
        Self {
            command,
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// The external collaborators of an install run.
///
/// `Err` means the tool could not be run at all; a tool that ran and failed
/// is an `Ok` with `success == false`.
pub trait Toolbox {
    /// Unpack `archive` into `work_dir`.
    fn extract_archive(&mut self, archive: &Path, work_dir: &Path) -> Result<CapturedOutput>;

    /// Columnar block device listing with NAME, SIZE, TYPE and MODEL.
    fn list_block_devices(&mut self) -> Result<CapturedOutput>;

    /// Write the bootable image to the operator's disk. Needs root.
    fn prepare_bootable_usb(&mut self, args: &BootableUsbArgs, work_dir: &Path)
        -> Result<ScriptOutput>;
}

/// Toolbox backed by the host's binaries.
#[derive(Debug, Default)]
pub struct SystemToolbox;

impl SystemToolbox {
    pub fn new() -> Self {
        Self
    }
}

impl Toolbox for SystemToolbox {
    fn extract_archive(&mut self, archive: &Path, work_dir: &Path) -> Result<CapturedOutput> {
        let mut cmd = Command::new("tar");
        cmd.arg("-xvf").arg(archive).current_dir(work_dir);
        let command = script_runner::describe(&cmd);
        let output = run_captured(&mut cmd)?;
        Ok(CapturedOutput::from_output(command, output))
    }

    fn list_block_devices(&mut self) -> Result<CapturedOutput> {
        let mut cmd = Command::new("lsblk");
        cmd.args(["-o", "NAME,SIZE,TYPE,MODEL"]);
        let command = script_runner::describe(&cmd);
        let output = run_captured(&mut cmd)?;
        Ok(CapturedOutput::from_output(command, output))
    }

    fn prepare_bootable_usb(
        &mut self,
        args: &BootableUsbArgs,
        work_dir: &Path,
    ) -> Result<ScriptOutput> {
        run_script_safe(args, work_dir)
    }
}

/// Keep only the rows of an `lsblk` listing that describe whole disks.
///
/// Matching is a plain substring test on `disk`, so a model string
/// containing the word also passes.
pub fn disk_lines(listing: &str) -> Vec<&str> {
    listing.lines().filter(|line| line.contains("disk")).collect()
}
