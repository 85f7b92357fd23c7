//! Error handling module for the SEN USB installer
//!
//! Provides the install workflow's error taxonomy using thiserror. Every
//! variant raised during a run is caught by `Installer::install` and turned
//! into a boolean failure; none of them escapes the top-level driver.

use std::path::PathBuf;

use thiserror::Error;

use crate::config_file::InputField;

/// Main error type for the install workflow
#[derive(Error, Debug)]
pub enum InstallError {
    /// The installation archive was not found anywhere under the work dir
    #[error("File {0} not found")]
    ArtifactNotFound(String),

    /// `tar` exited non-zero; carries its captured output streams
    #[error("Failed to unzip")]
    ExtractionFailed {
        command: String,
        stdout: String,
        stderr: String,
    },

    /// A file the archive must provide is absent after extraction
    #[error("{0} is not present.")]
    MissingRequiredFile(String),

    /// An operator answer failed its format check
    #[error("{}", invalid_input_message(.0))]
    InvalidInput(InputField),

    /// The configuration file could not be written
    #[error("Configuration file {} could not be written: {source}", .path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bootable USB preparation script exited non-zero
    #[error("Bootable USB preparation failed.")]
    PreparationFailed {
        command: String,
        exit_code: Option<i32>,
    },

    /// The operator interrupted the run
    #[error("Installation aborted by user")]
    UserAborted,

    /// Anything else (collaborator I/O, spawn failures, closed stdin)
    #[error("{0:#}")]
    Unexpected(anyhow::Error),
}

/// Result type alias for install workflow operations
pub type Result<T> = std::result::Result<T, InstallError>;

fn invalid_input_message(field: &InputField) -> String {
    match field {
        InputField::UserName | InputField::Password => {
            "User name or password cannot be empty.".to_string()
        }
        other => format!("Invalid {} format.", other.format_name()),
    }
}

impl InstallError {
    /// The command line that failed, for the "Failed command" diagnostic
    pub fn failed_command(&self) -> Option<&str> {
        match self {
            Self::ExtractionFailed { command, .. } | Self::PreparationFailed { command, .. } => {
                Some(command)
            }
            _ => None,
        }
    }

    /// Whether this outcome is an operator interruption rather than a failure
    pub fn is_user_abort(&self) -> bool {
        matches!(self, Self::UserAborted)
    }
}

impl From<anyhow::Error> for InstallError {
    fn from(err: anyhow::Error) -> Self {
        let interrupted = err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::Interrupted)
        });
        if interrupted {
            Self::UserAborted
        } else {
            Self::Unexpected(err)
        }
    }
}
