//! Operator-facing console styling
//!
//! Single source of truth for the colored lines the installer prints:
//! green prompts and progress, red errors, yellow warnings.

use crossterm::style::{StyledContent, Stylize};

/// Shown when the operator interrupts the run
pub const USER_ABORTED: &str = "Installation aborted by user";

/// A prompt label in the installer's prompt color
pub fn prompt(text: &str) -> StyledContent<&str> {
    text.green()
}

/// A green progress or success line
pub fn success(text: &str) {
    println!("{}", text.green());
}

/// `ERROR: <text>` with a red label
pub fn error(text: &str) {
    println!("{} {}", "ERROR:".red(), text);
}

/// A whole line in red
pub fn error_line(text: &str) {
    println!("{}", text.red());
}

/// `Failed command : <cmd>` with a red label
pub fn failed_command(command: &str) {
    println!("{} {}", "Failed command :".red(), command);
}

/// `WARNING: <text>` with a yellow label
pub fn warning(text: &str) {
    println!("{} {}", "WARNING:".yellow(), text);
}

/// Section banner printed when the workflow starts
pub fn banner() {
    println!("-------+----+-- Installation Begins --+----+-------");
}
