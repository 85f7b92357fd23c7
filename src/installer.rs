//! Install workflow
//!
//! Drives one run from archive to bootable USB. Every step depends on the
//! previous one succeeding:
//!
//! 1. Find `sen-installation-files.tar.gz` under the work dir
//! 2. Extract it into the work dir
//! 3. Check the four required files are present
//! 4. Ask for proxies, NO_PROXY, SSH key, user name and password, rejecting
//!    the first malformed answer
//! 5. Write `config-file`
//! 6. Show the disks `lsblk` reports
//! 7. Ask for the target disk
//! 8. Run `bootable-usb-prepare.sh` against it as root
//!
//! A bad answer ends the run; there is no retry prompt.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::artifacts::{self, CONFIG_FILE};
use crate::config_file::{InputField, InstallConfig};
use crate::error::{InstallError, Result};
use crate::process_guard::{self, ProcessGuard};
use crate::prompt::Prompter;
use crate::script_traits::BootableUsbArgs;
use crate::theme;
use crate::toolbox::{self, Toolbox};
use crate::validation::{is_valid_no_proxy, is_valid_proxy, is_valid_ssh_key};

/// Name used in start/complete log markers
pub const MODULE_NAME: &str = "Standalone Edge Node bootable USB installer";

/// Installer version written to the log at startup
pub const INSTALLER_VERSION: &str = "1.0";

/// Prompt for the target disk
pub const DISK_PROMPT: &str = "Enter the disk (e.g., /dev/sda, /dev/sdb): ";

/// Whether `value` is an acceptable answer for `field`.
///
/// Proxies may be left blank; user name and password may not.
pub fn accepts(field: InputField, value: &str) -> bool {
    match field {
        InputField::HttpProxy | InputField::HttpsProxy => {
            value.is_empty() || is_valid_proxy(value)
        }
        InputField::NoProxy => is_valid_no_proxy(value),
        InputField::SshKey => is_valid_ssh_key(value),
        InputField::UserName | InputField::Password => !value.is_empty(),
    }
}

/// Scoped cleanup for one run.
///
/// Dropped on every exit path from [`Installer::install`]: terminates any
/// child still tracked and puts the terminal back in cooked mode.
struct RunGuard {
    _processes: ProcessGuard,
}

impl RunGuard {
    fn acquire() -> Self {
        Self {
            _processes: ProcessGuard::new(),
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        debug!("Cleaning up temporary run state");
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

/// One install run against a work dir.
pub struct Installer<P: Prompter, T: Toolbox> {
    work_dir: PathBuf,
    prompter: P,
    toolbox: T,
}

impl<P: Prompter, T: Toolbox> Installer<P, T> {
    pub fn new(work_dir: impl Into<PathBuf>, prompter: P, toolbox: T) -> Self {
        info!("Version - {}", INSTALLER_VERSION);
        Self {
            work_dir: work_dir.into(),
            prompter,
            toolbox,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn toolbox(&self) -> &T {
        &self.toolbox
    }

    /// Path of the answers file this run writes
    pub fn config_path(&self) -> PathBuf {
        self.work_dir.join(CONFIG_FILE)
    }

    /// Run the workflow and report the outcome to the operator.
    ///
    /// No error escapes: each one is logged, printed and turned into `false`.
    pub fn install(&mut self) -> bool {
        let guard = RunGuard::acquire();
        let status = match self.run() {
            Ok(()) => true,
            Err(err) => {
                report_failure(&err);
                false
            }
        };
        drop(guard);

        if status {
            info!("Successfully installed {}", MODULE_NAME);
        } else {
            error!("Installation failed for {}", MODULE_NAME);
        }
        status
    }

    /// The install and post-install phases, with errors propagated.
    pub fn run(&mut self) -> Result<()> {
        self.main_install()?;
        self.main_post_install()
    }

    fn main_install(&mut self) -> Result<()> {
        info!("Main installation started for {}", MODULE_NAME);
        self.prepare_bootable_usb()?;
        info!("Main installation complete for {}", MODULE_NAME);
        Ok(())
    }

    fn main_post_install(&mut self) -> Result<()> {
        info!("Post installation started for {}", MODULE_NAME);
        self.verify_installation()?;
        info!("Post installation complete for {}", MODULE_NAME);
        Ok(())
    }

    fn prepare_bootable_usb(&mut self) -> Result<()> {
        info!("----------------------------------------");
        info!("Installation started: Standalone Edge Node enablement");
        info!("----------------------------------------");
        theme::banner();
        info!("Installation begins.");

        let archive = artifacts::locate_archive(&self.work_dir)?;
        info!("Found installation archive at {}", archive.display());

        self.extract(&archive)?;
        artifacts::verify_required_files(&self.work_dir)?;

        let config = self.collect_answers()?;
        let config_path = self.config_path();
        config.write_to_file(&config_path)?;
        // Scrub the answers now that the script's copy is on disk
        drop(config);
        theme::success("Configuration file updated successfully!");
        info!("Wrote answers to {}", config_path.display());

        self.show_disks();

        let disk = self.prompter.ask(DISK_PROMPT)?.trim().to_string();
        theme::success(&format!("You selected the disk: {}", disk));
        info!("Operator selected disk {:?}", disk);

        self.write_image(&disk)
    }

    fn extract(&mut self, archive: &Path) -> Result<()> {
        let output = self.toolbox.extract_archive(archive, &self.work_dir)?;
        ensure_not_aborted()?;

        if !output.success {
            error!("Error during tar extraction.");
            error!("Standard Output: {}", output.stdout);
            error!("Standard Error: {}", output.stderr);
            return Err(InstallError::ExtractionFailed {
                command: output.command,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        debug!("Extracted {} entries", output.stdout.lines().count());
        Ok(())
    }

    /// Ask each question in order, stopping at the first unacceptable answer.
    fn collect_answers(&mut self) -> Result<InstallConfig> {
        let mut config = InstallConfig {
            http_proxy: self.ask_field(InputField::HttpProxy)?,
            ..Default::default()
        };
        config.https_proxy = self.ask_field(InputField::HttpsProxy)?;
        config.no_proxy = self.ask_field(InputField::NoProxy)?;
        config.ssh_key = self.ask_field(InputField::SshKey)?;
        config.user_name = self.ask_field(InputField::UserName)?;

        config.password = self.prompter.ask_secret(InputField::Password.prompt())?;
        if !accepts(InputField::Password, &config.password) {
            return Err(reject(InputField::Password));
        }
        Ok(config)
    }

    fn ask_field(&mut self, field: InputField) -> Result<String> {
        let answer = self.prompter.ask(field.prompt())?;
        if accepts(field, &answer) {
            Ok(answer)
        } else {
            Err(reject(field))
        }
    }

    /// Print the disks `lsblk` reports. A listing failure is not fatal.
    fn show_disks(&mut self) {
        match self.toolbox.list_block_devices() {
            Ok(output) if output.success => {
                let disks = toolbox::disk_lines(&output.stdout);
                if !disks.is_empty() {
                    theme::success("Disk Information:\n");
                    println!("{}", disks.join("\n"));
                }
            }
            Ok(output) => {
                theme::error_line("Error running lsblk:");
                error!("{}", output.stderr);
            }
            Err(e) => {
                println!("Error: {:#}", e);
                error!("Exception occurred: {:#}", e);
            }
        }
    }

    fn write_image(&mut self, disk: &str) -> Result<()> {
        theme::success(
            "Starting bootable USB preparation, This process will take approximately 10 minutes...",
        );
        let args = BootableUsbArgs::for_disk(disk);
        let output = self.toolbox.prepare_bootable_usb(&args, &self.work_dir)?;
        ensure_not_aborted()?;

        if output.success {
            theme::success("Bootable USB preparation completed successfully!");
            info!("Bootable USB preparation completed successfully.");
            Ok(())
        } else {
            error!(
                "Error during bootable USB preparation (exit code {:?})",
                output.exit_code
            );
            theme::error_line("Error during bootable USB preparation. See logs for details.");
            Err(InstallError::PreparationFailed {
                command: output.command,
                exit_code: output.exit_code,
            })
        }
    }

    /// Check the answers file the preparation script was handed is still there.
    ///
    /// Only its presence is inspected; the contents carry the password and
    /// are never read back. A script that consumed the file does not fail the
    /// run.
    fn verify_installation(&self) -> Result<()> {
        info!("Verifying the installation...");
        let path = self.config_path();
        if path.is_file() {
            debug!("{} is still present", path.display());
        } else {
            warn!("{} was removed by the preparation step", path.display());
        }
        Ok(())
    }
}

fn reject(field: InputField) -> InstallError {
    error!("Invalid {} format. Exiting...", field.format_name());
    InstallError::InvalidInput(field)
}

fn ensure_not_aborted() -> Result<()> {
    if process_guard::abort_requested() {
        Err(InstallError::UserAborted)
    } else {
        Ok(())
    }
}

/// Log and print a failed run.
fn report_failure(err: &InstallError) {
    match err {
        InstallError::UserAborted => {
            theme::warning(theme::USER_ABORTED);
            warn!("{}", theme::USER_ABORTED);
        }
        other => {
            error!("{}", other);
            theme::error(&other.to_string());
        }
    }
    if let Some(command) = err.failed_command() {
        debug!("Failed command: {}", command);
        theme::failed_command(command);
    }
}

/// Resolve the work dir, defaulting to the process's current directory.
pub fn resolve_work_dir(requested: Option<&Path>) -> anyhow::Result<PathBuf> {
    match requested {
        Some(path) => path
            .canonicalize()
            .with_context(|| format!("Work directory {:?} is not accessible", path)),
        None => std::env::current_dir().context("Failed to determine the current directory"),
    }
}
