//! Command-line argument definition and processing.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;

/// apcheck - Find installed packages that come from outside the official repositories and check them against the AUR
#[derive(Parser, Debug)]
#[command(name = "apcheck")]
#[command(version)]
#[command(about = "Check externally installed packages against the AUR", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// List packages not provided by the official repositories and exit
    #[arg(short, long)]
    pub list_external: bool,

    /// Search the AUR for packages matching PATTERN
    #[arg(short, long, value_name = "PATTERN", conflicts_with = "list_external")]
    pub search: Option<String>,

    /// Only report packages with updates or failed lookups
    #[arg(long)]
    pub outdated: bool,

    /// Number of concurrent AUR lookups
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Per-lookup timeout in seconds (0 disables the timeout)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// AUR RPC endpoint to query
    #[arg(long, value_name = "URL")]
    pub registry_url: Option<String>,

    /// Specify the configuration directory (default: ~/.config/apcheck)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// What the invocation asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Reconcile external packages against the AUR and print the report.
    Check,
    /// Print the names of external packages.
    ListExternal,
    /// Search the AUR.
    Search(String),
}

impl Args {
    /// Selected operating mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        if let Some(pattern) = &self.search {
            Mode::Search(pattern.clone())
        } else if self.list_external {
            Mode::ListExternal
        } else {
            Mode::Check
        }
    }

    /// What: Overlay command-line values onto file settings.
    ///
    /// Inputs:
    /// - `settings`: Settings loaded from `settings.conf`.
    ///
    /// Output:
    /// - Settings with every flag that was given taking precedence.
    #[must_use]
    pub fn apply_to(&self, mut settings: Settings) -> Settings {
        if let Some(n) = self.concurrency {
            settings.concurrency = usize::from(n);
        }
        if let Some(secs) = self.timeout {
            settings.lookup_timeout_secs = secs;
        }
        if let Some(url) = &self.registry_url {
            settings.registry_url.clone_from(url);
        }
        settings
    }

    /// `true` when ANSI colors should be written to stdout.
    #[must_use]
    pub fn color(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none()
    }
}
