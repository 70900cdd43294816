//! Filesystem locations for settings and logs.

use std::env;
use std::path::{Path, PathBuf};

/// Directory name used under the user's config base.
const APP_DIR: &str = "apcheck";
/// Settings file name inside the config directory.
pub const SETTINGS_FILE: &str = "settings.conf";
/// Log file name inside the logs directory.
pub const LOG_FILE: &str = "apcheck.log";

/// Resolve an XDG base directory from environment or default to `$HOME` + segments.
///
/// Inputs:
/// - `var`: Environment variable to check (e.g., `XDG_CONFIG_HOME`).
/// - `home_default`: Fallback path segments relative to `$HOME` if `var` is unset/empty.
///
/// Output: Resolved base directory path.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// Return `$HOME/.config/apcheck` when HOME is set and the directory can be created.
fn home_config_dir() -> Option<PathBuf> {
    let home = env::var("HOME").ok()?;
    let dir = Path::new(&home).join(".config").join(APP_DIR);
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// What: Resolve the configuration directory.
///
/// Inputs:
/// - `override_dir`: Directory given on the command line, if any.
///
/// Output:
/// - The directory that holds `settings.conf` and `logs/`.
///
/// Details:
/// - Priority: explicit override, `$HOME/.config/apcheck`, then
///   `$XDG_CONFIG_HOME/apcheck` (or `~/.config/apcheck`).
/// - Creation is best effort; a missing directory only means defaults.
#[must_use]
pub fn config_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = home_config_dir() {
        return dir;
    }
    let dir = xdg_base_dir("XDG_CONFIG_HOME", &[".config"]).join(APP_DIR);
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Logs directory under `config_dir` (ensured to exist when possible).
#[must_use]
pub fn logs_dir(config_dir: &Path) -> PathBuf {
    let dir = config_dir.join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Path of `settings.conf` under `config_dir`.
#[must_use]
pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}
