//! `pacman`-backed package store.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::util::pacman::run_pacman;

use super::{PackageRecord, PackageStore, RepositoryIndex};

/// What: Snapshot of the local and sync databases taken through `pacman`.
///
/// Inputs:
/// - Created by `PacmanStore::open` with the list of trusted database names.
///
/// Output:
/// - Implements `PackageStore` over the captured snapshots.
///
/// Details:
/// - Both snapshots are taken once; nothing is re-queried during a run.
#[derive(Debug)]
pub struct PacmanStore {
    /// Output of `pacman -Q`.
    installed: Vec<PackageRecord>,
    /// Trusted sync databases present on this machine.
    official: Vec<RepositoryIndex>,
}

impl PacmanStore {
    /// What: Acquire the local and sync database snapshots.
    ///
    /// Inputs:
    /// - `official_repos`: Names of sync databases to trust (e.g. `core`, `extra`).
    ///
    /// Output:
    /// - A ready store, or `StoreError` if pacman cannot be queried.
    ///
    /// # Errors
    /// - Returns `Err` when `pacman -Q` or `pacman -Sl` fails.
    /// - Returns `Err` when either output contains a malformed line.
    ///
    /// Details:
    /// - Databases listed in `official_repos` but not configured in
    ///   `pacman.conf` are skipped with a debug log.
    pub fn open(official_repos: &[String]) -> Result<Self, StoreError> {
        let installed = parse_installed(&run_pacman(&["-Q"])?)?;
        let mut official = parse_sync_listing(&run_pacman(&["-Sl"])?)?;
        official.retain(|idx| {
            let trusted = official_repos.iter().any(|r| r == &idx.name);
            if trusted {
                tracing::debug!(db = %idx.name, label = %idx.label, packages = idx.len(), "detected official db");
            }
            trusted
        });
        for repo in official_repos {
            if !official.iter().any(|idx| &idx.name == repo) {
                tracing::debug!(db = %repo, "official db not configured; skipping");
            }
        }
        tracing::info!(
            installed = installed.len(),
            official_dbs = official.len(),
            "package store opened"
        );
        Ok(Self {
            installed,
            official,
        })
    }
}

impl PackageStore for PacmanStore {
    fn installed_packages(&self) -> &[PackageRecord] {
        &self.installed
    }

    fn official_indexes(&self) -> &[RepositoryIndex] {
        &self.official
    }

    fn release(self) -> Result<(), StoreError> {
        tracing::debug!(
            installed = self.installed.len(),
            official_dbs = self.official.len(),
            "package store released"
        );
        Ok(())
    }
}

/// What: Parse `pacman -Q` output into package records.
///
/// Inputs:
/// - `body`: Lines of `name version`.
///
/// Output:
/// - Records in output order.
///
/// # Errors
/// - Returns `StoreError::Parse` for any non-blank line without exactly two fields.
pub fn parse_installed(body: &str) -> Result<Vec<PackageRecord>, StoreError> {
    body.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let mut it = line.split_whitespace();
            match (it.next(), it.next(), it.next()) {
                (Some(name), Some(version), None) => Ok(PackageRecord::new(name, version)),
                _ => Err(StoreError::Parse {
                    line: line.to_string(),
                }),
            }
        })
        .collect()
}

/// What: Parse `pacman -Sl` output into one index per sync database.
///
/// Inputs:
/// - `body`: Lines of `repo name version [installed...]`.
///
/// Output:
/// - Indexes in the order their database first appears.
///
/// # Errors
/// - Returns `StoreError::Parse` for lines with fewer than three fields.
///
/// Details:
/// - Trailing markers such as `[installed]` or `[installed: 1.0-1]` are ignored.
pub fn parse_sync_listing(body: &str) -> Result<Vec<RepositoryIndex>, StoreError> {
    let mut order: Vec<String> = Vec::new();
    let mut by_repo: HashMap<String, Vec<PackageRecord>> = HashMap::new();
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let mut it = line.split_whitespace();
        let (Some(repo), Some(name), Some(version)) = (it.next(), it.next(), it.next()) else {
            return Err(StoreError::Parse {
                line: line.to_string(),
            });
        };
        by_repo
            .entry(repo.to_string())
            .or_insert_with(|| {
                order.push(repo.to_string());
                Vec::new()
            })
            .push(PackageRecord::new(name, version));
    }
    Ok(order
        .into_iter()
        .map(|repo| {
            let records = by_repo.remove(&repo).unwrap_or_default();
            RepositoryIndex::new(repo, records)
        })
        .collect())
}
