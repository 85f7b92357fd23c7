use clap::Parser;
use std::path::{Path, PathBuf};

/// SEN USB installer - prepare a bootable USB drive for a Standalone Edge Node
///
/// Run it from the directory holding `sen-installation-files.tar.gz`. All
/// configuration is collected through interactive prompts.
#[derive(Parser, Debug)]
#[command(name = "sen-usb-installer")]
#[command(about = "Prepare a bootable USB drive for a Standalone Edge Node")]
#[command(version)]
pub struct Cli {
    /// Directory to search for the archive and extract it into.
    ///
    /// Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Directory for `install.log`.
    ///
    /// Defaults to `<work-dir>/log`.
    #[arg(long, value_name = "DIR")]
    pub output_path: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The log directory for a run rooted at `work_dir`
    pub fn output_path_for(&self, work_dir: &Path) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| work_dir.join("log"))
    }
}
