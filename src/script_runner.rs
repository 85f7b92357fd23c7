//! Registered Child Execution
//!
//! Every external process the installer starts goes through this module so
//! that it is tracked by the [`ChildRegistry`] for the whole time it runs:
//!
//! - [`run_captured`] for short, non-interactive tools whose output is
//!   collected (`tar`, `lsblk`). They run in their own process group.
//! - [`run_script_safe`] for bundled scripts that talk to the operator.
//!   They keep the terminal and stay in the foreground process group.
//!
//! Neither applies a timeout. A hung child blocks the run until it exits or
//! the operator interrupts it.

use std::path::Path;
use std::process::{Child, Command, Output, Stdio};

use anyhow::{Context, Result};
use tracing::info;

use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use crate::script_traits::ScriptArgs;

/// Execute a bundled script from `work_dir` with type-safe arguments.
///
/// Scripts that require root are wrapped in `sudo` unless the installer
/// already runs as root. Stdio is inherited so the script can prompt.
///
/// # Returns
///
/// - `Ok(output)` - Script ran to completion, successfully or not
/// - `Err` - Script could not be spawned or waited on
pub fn run_script_safe<T: ScriptArgs>(args: &T, work_dir: &Path) -> Result<ScriptOutput> {
    let script_path = work_dir.join(args.script_name());
    let cli_args = args.to_cli_args();
    let elevate = args.requires_root() && !nix::unistd::geteuid().is_root();

    let mut cmd = if elevate {
        let mut cmd = Command::new("sudo");
        cmd.arg(format!("./{}", args.script_name()));
        cmd
    } else {
        Command::new(&script_path)
    };
    cmd.args(&cli_args)
        .current_dir(work_dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .with_parent_death_signal();

    let command = describe(&cmd);
    info!("run_script_safe: {} (cwd={})", command, work_dir.display());

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn script: {}", script_path.display()))?;
    let status = wait_registered(child, false, |mut child| child.wait())
        .with_context(|| format!("Failed waiting for script: {}", args.script_name()))?;

    let exit_code = status.code();
    if status.success() {
        info!("Script {} executed successfully", args.script_name());
    } else {
        info!(
            "Script {} failed with exit code {}",
            args.script_name(),
            exit_code.unwrap_or(-1)
        );
    }

    Ok(ScriptOutput {
        command,
        exit_code,
        success: status.success(),
    })
}

/// Run a non-interactive tool and collect its output.
pub fn run_captured(cmd: &mut Command) -> Result<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .in_new_process_group();

    let command = describe(cmd);
    tracing::debug!("run_captured: {}", command);

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn {}", command))?;
    wait_registered(child, true, Child::wait_with_output)
        .with_context(|| format!("Failed waiting for {}", command))
}

/// Keep `child` in the global registry until `wait` has reaped it.
fn wait_registered<R>(
    child: Child,
    group_leader: bool,
    wait: impl FnOnce(Child) -> std::io::Result<R>,
) -> std::io::Result<R> {
    let pid = child.id();
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        if group_leader {
            registry.register_group_leader(pid);
        } else {
            registry.register(pid);
        }
    }

    let result = wait(child);

    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }
    result
}

/// Render a command the way an operator would type it.
pub fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of a bundled script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Command line that was run
    pub command: String,
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
    /// Whether the script exited successfully (exit code 0)
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    struct EchoArgs(&'static str);

    impl ScriptArgs for EchoArgs {
        fn to_cli_args(&self) -> Vec<String> {
            vec![self.0.to_string()]
        }

        fn script_name(&self) -> &'static str {
            "probe.sh"
        }
    }

    fn write_script(dir: &Path, body: &str) {
        let path = dir.join("probe.sh");
        fs::write(&path, format!("#!/bin/bash\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_run_script_safe_success_runs_in_work_dir() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "echo \"$1\" > seen.txt");

        let output = run_script_safe(&EchoArgs("hello"), dir.path()).unwrap();

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert!(output.command.ends_with("probe.sh hello"), "{}", output.command);
        assert_eq!(fs::read_to_string(dir.path().join("seen.txt")).unwrap(), "hello\n");
    }

    #[test]
    fn test_run_script_safe_reports_failure() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "exit 3");

        let output = run_script_safe(&EchoArgs("x"), dir.path()).unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
    }

    #[test]
    fn test_run_script_safe_missing_script_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(run_script_safe(&EchoArgs("x"), dir.path()).is_err());
    }

    #[test]
    fn test_run_captured_collects_streams() {
        let output = run_captured(Command::new("bash").args(["-c", "echo out; echo err >&2; exit 2"]))
            .unwrap();

        assert_eq!(output.status.code(), Some(2));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
    }

    #[test]
    fn test_describe() {
        let mut cmd = Command::new("tar");
        cmd.args(["-xvf", "/media/sen-installation-files.tar.gz"]);
        assert_eq!(describe(&cmd), "tar -xvf /media/sen-installation-files.tar.gz");
    }
}
