//! The answers collected from the operator and the `config-file` they are written to.
//!
//! The file is a flat list of `key="value"` lines sourced by
//! `bootable-usb-prepare.sh`. Its keys and their order are a contract with
//! that script:
//!
//! ```text
//! http_proxy="..."
//! https_proxy="..."
//! no_proxy="..."
//! HTTP_PROXY="..."
//! HTTPS_PROXY="..."
//! NO_PROXY="..."
//! ssh_key="..."
//! user_name="..."
//! passwd="..."
//! ```
//!
//! Values are written verbatim. An embedded `"` is not escaped and corrupts
//! the line for the shell that sources it.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use strum::{Display, EnumIter};
use zeroize::Zeroizing;

use crate::error::InstallError;

/// One operator prompt, in the order the installer asks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum InputField {
    #[strum(to_string = "HTTP proxy")]
    HttpProxy,
    #[strum(to_string = "HTTPS proxy")]
    HttpsProxy,
    #[strum(to_string = "NO_PROXY list")]
    NoProxy,
    #[strum(to_string = "SSH public key")]
    SshKey,
    #[strum(to_string = "user name")]
    UserName,
    #[strum(to_string = "password")]
    Password,
}

impl InputField {
    /// Name used in "Invalid ... format" diagnostics
    pub fn format_name(self) -> &'static str {
        match self {
            Self::HttpProxy => "HTTP proxy",
            Self::HttpsProxy => "HTTPS proxy",
            Self::NoProxy => "NO_PROXY",
            Self::SshKey => "SSH key",
            Self::UserName => "user name",
            Self::Password => "password",
        }
    }

    /// Prompt text shown to the operator
    pub fn prompt(self) -> &'static str {
        match self {
            Self::HttpProxy => "Enter the HTTP proxy (leave blank for none): ",
            Self::HttpsProxy => "Enter the HTTPS proxy (leave blank for none): ",
            Self::NoProxy => "Enter the NO_PROXY list (comma-separated): ",
            Self::SshKey => "Enter your SSH public key: ",
            Self::UserName => "Enter user name: ",
            Self::Password => "Enter password: ",
        }
    }
}

/// Validated answers for one run.
///
/// Built field by field by the installer and written once. The password is
/// scrubbed when the record is dropped; that is best-effort and does not
/// reach copies held by the terminal layer or the kernel.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InstallConfig {
    pub http_proxy: String,
    pub https_proxy: String,
    pub no_proxy: String,
    pub ssh_key: String,
    pub user_name: String,
    pub password: Zeroizing<String>,
}

impl fmt::Debug for InstallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallConfig")
            .field("http_proxy", &self.http_proxy)
            .field("https_proxy", &self.https_proxy)
            .field("no_proxy", &self.no_proxy)
            .field("ssh_key", &self.ssh_key)
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl InstallConfig {
    /// Key/value pairs in file order.
    pub fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("http_proxy", self.http_proxy.as_str()),
            ("https_proxy", self.https_proxy.as_str()),
            ("no_proxy", self.no_proxy.as_str()),
            ("HTTP_PROXY", self.http_proxy.as_str()),
            ("HTTPS_PROXY", self.https_proxy.as_str()),
            ("NO_PROXY", self.no_proxy.as_str()),
            ("ssh_key", self.ssh_key.as_str()),
            ("user_name", self.user_name.as_str()),
            ("passwd", self.password.as_str()),
        ]
    }

    /// Render the file body.
    pub fn render(&self) -> Zeroizing<String> {
        let mut out = Zeroizing::new(String::new());
        for (key, value) in self.entries() {
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(value);
            out.push_str("\"\n");
        }
        out
    }

    /// Write the file, truncating whatever was there.
    ///
    /// # Failure Modes
    ///
    /// - Parent directory missing or not writable: `FileUnavailable`
    pub fn write_to_file(&self, path: &Path) -> std::result::Result<(), InstallError> {
        let body = self.render();
        let unavailable = |source| InstallError::FileUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(unavailable)?;
        file.write_all(body.as_bytes()).map_err(unavailable)?;
        file.flush().map_err(unavailable)?;

        tracing::debug!("Wrote {} lines to {}", self.entries().len(), path.display());
        Ok(())
    }

    /// Read a file written by [`InstallConfig::write_to_file`].
    ///
    /// The lowercase proxy keys are authoritative; the uppercase copies are
    /// ignored. Unknown keys are ignored too.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = Zeroizing::new(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration from {:?}", path))?,
        );
        Self::parse(&content)
    }

    /// Parse `key="value"` lines.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = parse_assignment(line)
                .with_context(|| format!("Malformed assignment on line {}", number + 1))?;
            match key {
                "http_proxy" => config.http_proxy = value.to_string(),
                "https_proxy" => config.https_proxy = value.to_string(),
                "no_proxy" => config.no_proxy = value.to_string(),
                "ssh_key" => config.ssh_key = value.to_string(),
                "user_name" => config.user_name = value.to_string(),
                "passwd" => config.password = Zeroizing::new(value.to_string()),
                _ => {}
            }
        }
        Ok(config)
    }
}

/// Split `key="value"` into its parts.
fn parse_assignment(line: &str) -> Result<(&str, &str)> {
    let (key, rest) = line
        .split_once("=\"")
        .context("expected key=\"value\"")?;
    let value = rest
        .strip_suffix('"')
        .context("value is missing its closing quote")?;
    if key.is_empty() {
        anyhow::bail!("empty key");
    }
    Ok((key, value))
}
