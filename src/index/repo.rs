//! Labels for the sync databases apcheck recognizes as official.

use std::fmt;

/// What: Identify which trusted channel a repository index represents.
///
/// Inputs:
/// - Derived from a sync database name via `RepoLabel::from_db_name`.
///
/// Output:
/// - Closed set of official channels plus the `Unofficial` and `Local`
///   sentinels.
///
/// Details:
/// - `community` and `testing` were merged into `extra`/`*-testing` upstream
///   but are still recognized for systems with older `pacman.conf` files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RepoLabel {
    /// Any database that is not a known official channel.
    Unofficial,
    /// `core`
    Core,
    /// `extra`
    Extra,
    /// `community` (legacy)
    Community,
    /// `testing` (legacy)
    Testing,
    /// `multilib`
    Multilib,
    /// `multilib-testing`
    MultilibTesting,
    /// `core-testing`
    CoreTesting,
    /// `extra-testing`
    ExtraTesting,
    /// The locally installed package set.
    Local,
}

impl RepoLabel {
    /// Every official channel, in the order they are usually listed in `pacman.conf`.
    pub const OFFICIAL: [Self; 8] = [
        Self::Core,
        Self::Extra,
        Self::Community,
        Self::Testing,
        Self::Multilib,
        Self::MultilibTesting,
        Self::CoreTesting,
        Self::ExtraTesting,
    ];

    /// What: Map a sync database name to its label.
    ///
    /// Inputs:
    /// - `name`: Database name as printed by `pacman -Sl` (e.g. `core`).
    ///
    /// Output:
    /// - The matching official label, or `Unofficial` for anything else.
    ///
    /// Details:
    /// - Matching is exact and case-sensitive, like pacman's own section names.
    #[must_use]
    pub fn from_db_name(name: &str) -> Self {
        match name {
            "core" => Self::Core,
            "extra" => Self::Extra,
            "community" => Self::Community,
            "testing" => Self::Testing,
            "multilib" => Self::Multilib,
            "multilib-testing" => Self::MultilibTesting,
            "core-testing" => Self::CoreTesting,
            "extra-testing" => Self::ExtraTesting,
            "local" => Self::Local,
            _ => Self::Unofficial,
        }
    }

    /// Database name for this label; sentinels have no pacman section.
    #[must_use]
    pub const fn db_name(self) -> &'static str {
        match self {
            Self::Unofficial => "unofficial",
            Self::Core => "core",
            Self::Extra => "extra",
            Self::Community => "community",
            Self::Testing => "testing",
            Self::Multilib => "multilib",
            Self::MultilibTesting => "multilib-testing",
            Self::CoreTesting => "core-testing",
            Self::ExtraTesting => "extra-testing",
            Self::Local => "local",
        }
    }

    /// `true` for trusted channels, `false` for both sentinels.
    #[must_use]
    pub const fn is_official(self) -> bool {
        !matches!(self, Self::Unofficial | Self::Local)
    }
}

impl fmt::Display for RepoLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unofficial => "Unofficial",
            Self::Core => "Core",
            Self::Extra => "Extra",
            Self::Community => "Community",
            Self::Testing => "Testing",
            Self::Multilib => "Multilib",
            Self::MultilibTesting => "MultilibTesting",
            Self::CoreTesting => "CoreTesting",
            Self::ExtraTesting => "ExtraTesting",
            Self::Local => "Local",
        };
        f.write_str(name)
    }
}
