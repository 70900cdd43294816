//! Split installed packages into official and external sets.

use crate::index::{PackageRecord, RepositoryIndex};

/// Result of `classify`: every installed record lands in exactly one side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    /// Installed packages provided by at least one official index.
    pub official: Vec<PackageRecord>,
    /// Installed packages no official index provides.
    pub external: Vec<PackageRecord>,
}

/// What: Decide whether a package name is provided by any official index.
///
/// Inputs:
/// - `name`: Package name.
/// - `indexes`: Official repository indexes.
///
/// Output:
/// - `true` when at least one index contains `name`.
///
/// Details:
/// - Versions are ignored; presence by name is enough.
#[must_use]
pub fn is_official(name: &str, indexes: &[RepositoryIndex]) -> bool {
    indexes.iter().any(|idx| idx.contains(name))
}

/// What: Partition installed packages into official and external.
///
/// Inputs:
/// - `installed`: Installed package records.
/// - `indexes`: Official repository indexes.
///
/// Output:
/// - `Partition` whose two halves together equal `installed`, without overlap.
///
/// Details:
/// - Both halves preserve the relative order of `installed`.
/// - An empty `indexes` slice classifies every package as external.
#[must_use]
pub fn classify(installed: &[PackageRecord], indexes: &[RepositoryIndex]) -> Partition {
    let (official, external): (Vec<_>, Vec<_>) = installed
        .iter()
        .cloned()
        .partition(|pkg| is_official(&pkg.name, indexes));
    tracing::debug!(
        official = official.len(),
        external = external.len(),
        indexes = indexes.len(),
        "classified installed packages"
    );
    Partition { official, external }
}
