//! Reconciliation jobs, their state machine, and outcomes.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::LookupError;
use crate::index::PackageRecord;
use crate::logic::vercmp::VersionComparator;

/// Result of reconciling one external package.
#[derive(Debug)]
pub enum Outcome {
    /// Installed version equals (or is ahead of) the registry's.
    Current,
    /// The registry has a newer version.
    UpdateAvailable {
        /// Version reported by the registry.
        remote_version: String,
    },
    /// The registry lookup or the version comparison failed.
    LookupFailed {
        /// Why the job could not be reconciled.
        cause: LookupError,
    },
}

impl Outcome {
    /// `true` for `LookupFailed`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::LookupFailed { .. })
    }
}

/// Lifecycle of a job: `Pending -> InFlight -> Resolved`.
#[derive(Debug)]
pub enum JobState {
    /// Created by the dispatcher, not yet claimed.
    Pending,
    /// Claimed by a worker; lookup in progress.
    InFlight,
    /// Terminal; holds the outcome.
    Resolved(Outcome),
}

/// What: One unit of reconciliation work.
///
/// Inputs:
/// - `id`: Position of the job's record in the shared batch.
/// - `batch`: Every record dispatched in this run.
///
/// Output:
/// - Moves through `claim` and `resolve`, ending in `JobState::Resolved`.
///
/// Details:
/// - Jobs are moved, never shared: the worker that claims a job owns it until
///   it hands the resolved job back to the aggregator.
/// - The batch itself is shared read-only, so records are never copied per job.
#[derive(Debug)]
pub struct ReconciliationJob {
    /// Dispatch-order identifier and index into `batch`.
    pub id: usize,
    /// Records of the whole run.
    batch: Arc<Vec<PackageRecord>>,
    /// Current lifecycle state.
    state: JobState,
}

impl ReconciliationJob {
    /// What: Create one pending job per record of `batch`.
    ///
    /// Inputs:
    /// - `batch`: Records to reconcile, in dispatch order.
    ///
    /// Output:
    /// - Jobs whose ids are `0..batch.len()`.
    #[must_use]
    pub fn for_batch(batch: &Arc<Vec<PackageRecord>>) -> Vec<Self> {
        (0..batch.len())
            .map(|id| Self {
                id,
                batch: Arc::clone(batch),
                state: JobState::Pending,
            })
            .collect()
    }

    /// Package being reconciled.
    #[must_use]
    pub fn record(&self) -> &PackageRecord {
        &self.batch[self.id]
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &JobState {
        &self.state
    }

    /// What: Move a pending job to `InFlight`.
    ///
    /// Inputs:
    /// - None.
    ///
    /// Output:
    /// - `true` if the job was pending; `false` (and no change) otherwise.
    pub fn claim(&mut self) -> bool {
        if matches!(self.state, JobState::Pending) {
            self.state = JobState::InFlight;
            true
        } else {
            false
        }
    }

    /// What: Record the outcome of an in-flight job.
    ///
    /// Inputs:
    /// - `outcome`: Result of the lookup and comparison.
    ///
    /// Output:
    /// - `Ok(())` on the `InFlight -> Resolved` transition.
    ///
    /// # Errors
    /// - Returns the rejected outcome when the job is not in flight, so a
    ///   resolved job is never overwritten.
    pub fn resolve(&mut self, outcome: Outcome) -> Result<(), Outcome> {
        if matches!(self.state, JobState::InFlight) {
            self.state = JobState::Resolved(outcome);
            Ok(())
        } else {
            Err(outcome)
        }
    }

    /// `true` once the job reached its terminal state.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.state, JobState::Resolved(_))
    }

    /// Take the outcome of a resolved job.
    #[must_use]
    pub fn into_outcome(self) -> Option<Outcome> {
        match self.state {
            JobState::Resolved(outcome) => Some(outcome),
            JobState::Pending | JobState::InFlight => None,
        }
    }
}

/// What: Turn a successful lookup into an outcome.
///
/// Inputs:
/// - `local`: Installed version.
/// - `remote`: Registry version.
/// - `comparator`: Version ordering oracle.
///
/// Output:
/// - `Current` when `local >= remote`, `UpdateAvailable` when `local < remote`,
///   `LookupFailed` when either version cannot be compared.
///
/// Details:
/// - An installed version ahead of upstream is reported as `Current`.
pub fn decide_outcome<C: VersionComparator + ?Sized>(
    local: &str,
    remote: &str,
    comparator: &C,
) -> Outcome {
    match comparator.compare(local, remote) {
        Ok(Ordering::Less) => Outcome::UpdateAvailable {
            remote_version: remote.to_string(),
        },
        Ok(Ordering::Equal | Ordering::Greater) => Outcome::Current,
        Err(e) => Outcome::LookupFailed { cause: e.into() },
    }
}
