//! User settings: defaults, `settings.conf` parsing, and command-line overrides.

pub mod paths;

use std::path::Path;
use std::time::Duration;

use crate::error::AppError;
use crate::index::RepoLabel;
use crate::logic::reconcile::{DEFAULT_CONCURRENCY, DEFAULT_LOOKUP_TIMEOUT, ReconcileOptions};
use crate::sources::DEFAULT_AUR_RPC_URL;
use crate::util::config::{parse_key_value, skip_comment_or_empty};

/// Effective settings for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// AUR RPC endpoint.
    pub registry_url: String,
    /// Number of concurrent registry lookups.
    pub concurrency: usize,
    /// Per-lookup deadline in seconds; `0` disables the deadline.
    pub lookup_timeout_secs: u64,
    /// Sync databases whose packages count as official.
    pub official_repos: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_AUR_RPC_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT.as_secs(),
            official_repos: RepoLabel::OFFICIAL
                .iter()
                .map(|l| l.db_name().to_string())
                .collect(),
        }
    }
}

impl Settings {
    /// What: Load settings from a `settings.conf` file.
    ///
    /// Inputs:
    /// - `path`: Location of the settings file.
    ///
    /// Output:
    /// - Parsed settings, or defaults when the file does not exist.
    ///
    /// # Errors
    /// - `AppError::Config` when the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "loaded settings file");
                Ok(Self::parse(&content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(AppError::Config {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// What: Parse `settings.conf` content on top of the defaults.
    ///
    /// Inputs:
    /// - `content`: File text.
    ///
    /// Output:
    /// - Settings with every valid key applied.
    ///
    /// Details:
    /// - Unknown keys and invalid values are logged and skipped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut out = Self::default();
        for (lineno, line) in content.lines().enumerate() {
            if skip_comment_or_empty(line) {
                continue;
            }
            let Some((key, val)) = parse_key_value(line) else {
                tracing::warn!(line = lineno + 1, "ignoring settings line without '='");
                continue;
            };
            out.apply(lineno + 1, &key, &val);
        }
        out
    }

    /// Apply one normalized key/value pair.
    fn apply(&mut self, line: usize, key: &str, val: &str) {
        match key {
            "registry_url" | "aur_rpc_url" => {
                if val.starts_with("http://") || val.starts_with("https://") {
                    self.registry_url = val.to_string();
                } else {
                    tracing::warn!(line, value = val, "registry_url must be an http(s) URL");
                }
            }
            "concurrency" | "workers" => match val.parse::<usize>() {
                Ok(n) if n > 0 => self.concurrency = n,
                _ => tracing::warn!(line, value = val, "concurrency must be a positive integer"),
            },
            "lookup_timeout_secs" | "timeout" => match val.parse::<u64>() {
                Ok(n) => self.lookup_timeout_secs = n,
                Err(_) => tracing::warn!(line, value = val, "lookup_timeout_secs must be an integer"),
            },
            "official_repos" => {
                let repos: Vec<String> = val
                    .split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect();
                if repos.is_empty() {
                    tracing::warn!(line, "official_repos is empty; keeping defaults");
                } else {
                    self.official_repos = repos;
                }
            }
            _ => tracing::warn!(line, key, "unknown settings key"),
        }
    }

    /// Per-lookup deadline, `None` when disabled.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Option<Duration> {
        if self.lookup_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.lookup_timeout_secs))
        }
    }

    /// Pool options derived from these settings.
    #[must_use]
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            concurrency: self.concurrency,
            lookup_timeout: self.lookup_timeout(),
        }
    }
}
