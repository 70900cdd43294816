//! Package store adapter: installed packages and official repository indexes.
//!
//! The store is opened once at startup and handed to the classifier as
//! read-only snapshots. `PacmanStore` is the production backend; tests
//! construct `StaticStore` directly.

use std::collections::HashMap;

use crate::error::StoreError;

mod pacman;
mod repo;

pub use pacman::{PacmanStore, parse_installed, parse_sync_listing};
pub use repo::RepoLabel;

/// What: One installed or indexed package.
///
/// Inputs:
/// - Parsed from `pacman -Q` / `pacman -Sl` output or built by tests.
///
/// Output:
/// - Immutable `(name, version)` pair consumed by the classifier and pipeline.
///
/// Details:
/// - `version` uses the `epoch:version-release` layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackageRecord {
    /// Package name, unique within one index.
    pub name: String,
    /// Versioned identifier.
    pub version: String,
}

impl PackageRecord {
    /// Build a record from anything string-like.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// What: A named collection of package records for one source.
///
/// Inputs:
/// - Built from parsed store output, keyed by package name.
///
/// Output:
/// - Queryable by name via `lookup`/`contains`.
///
/// Details:
/// - Later records with a duplicate name replace earlier ones, keeping names unique.
#[derive(Clone, Debug)]
pub struct RepositoryIndex {
    /// Database name as reported by the store (e.g. `core`).
    pub name: String,
    /// Channel this index represents.
    pub label: RepoLabel,
    /// Records keyed by package name.
    records: HashMap<String, PackageRecord>,
}

impl RepositoryIndex {
    /// What: Build an index from a sequence of records.
    ///
    /// Inputs:
    /// - `name`: Database name.
    /// - `records`: Package records belonging to the database.
    ///
    /// Output:
    /// - Index labelled via `RepoLabel::from_db_name`.
    pub fn new(name: impl Into<String>, records: impl IntoIterator<Item = PackageRecord>) -> Self {
        let name = name.into();
        let label = RepoLabel::from_db_name(&name);
        let records = records
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();
        Self {
            name,
            label,
            records,
        }
    }

    /// Find a record by exact package name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&PackageRecord> {
        self.records.get(name)
    }

    /// `true` when `name` is present in this index.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Number of records in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What: Read-only access to the package database snapshots.
///
/// Inputs:
/// - Implementations acquire their backing handle when constructed.
///
/// Output:
/// - Installed packages in store order and the official indexes.
///
/// Details:
/// - `release` consumes the store; callers must invoke it exactly once on
///   every exit path and treat its error as fatal.
pub trait PackageStore {
    /// Installed packages, in the order the store reports them.
    fn installed_packages(&self) -> &[PackageRecord];

    /// Official repository indexes configured on this machine.
    fn official_indexes(&self) -> &[RepositoryIndex];

    /// Release the backing handle.
    ///
    /// # Errors
    /// - Returns `StoreError` when the handle cannot be released cleanly.
    fn release(self) -> Result<(), StoreError>;
}

/// In-memory store for tests and for callers that already hold snapshots.
#[derive(Clone, Debug, Default)]
pub struct StaticStore {
    /// Installed packages.
    pub installed: Vec<PackageRecord>,
    /// Official indexes.
    pub official: Vec<RepositoryIndex>,
}

impl PackageStore for StaticStore {
    fn installed_packages(&self) -> &[PackageRecord] {
        &self.installed
    }

    fn official_indexes(&self) -> &[RepositoryIndex] {
        &self.official
    }

    fn release(self) -> Result<(), StoreError> {
        Ok(())
    }
}
