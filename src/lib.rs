//! SEN USB Installer Library
//!
//! Core of the interactive installer that turns a bundled archive into a
//! bootable USB drive for a Standalone Edge Node.

pub mod artifacts;
pub mod cli;
pub mod config_file;
pub mod error;
pub mod installer;
pub mod logging;
pub mod process_guard;
pub mod prompt;
pub mod sanity;
pub mod script_runner;
pub mod script_traits;
pub mod theme;
pub mod toolbox;
pub mod validation;

// Re-export main types for convenience
pub use config_file::{InputField, InstallConfig};
pub use error::InstallError;
pub use installer::Installer;
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use prompt::{Prompter, TerminalPrompter};
pub use script_runner::{run_script_safe, ScriptOutput};
pub use script_traits::{BootableUsbArgs, ScriptArgs};
pub use toolbox::{CapturedOutput, SystemToolbox, Toolbox};
pub use validation::{is_valid_no_proxy, is_valid_proxy, is_valid_ssh_key};
