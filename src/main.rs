//! SEN USB installer - Main entry point

use std::process::ExitCode;

use sen_installer::cli::Cli;
use sen_installer::installer::{self, Installer};
use sen_installer::{logging, process_guard, sanity, theme, SystemToolbox, TerminalPrompter};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let work_dir = match installer::resolve_work_dir(cli.work_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            theme::error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    let output_path = cli.output_path_for(&work_dir);
    if let Err(e) = logging::init_file_logger(&output_path) {
        theme::error(&format!("{:#}", e));
        return ExitCode::FAILURE;
    }
    tracing::info!("Installer starting in {}", work_dir.display());

    // Signal handlers make Ctrl+C an orderly abort instead of a crash
    if let Err(e) = process_guard::init_signal_handlers() {
        tracing::warn!("Failed to initialize signal handlers: {}", e);
    }

    let preflight = sanity::verify_environment();
    tracing::debug!("Pre-flight check: {:?}", preflight);
    sanity::report(&preflight);

    let mut installer = Installer::new(work_dir, TerminalPrompter::new(), SystemToolbox::new());
    if installer.install() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
