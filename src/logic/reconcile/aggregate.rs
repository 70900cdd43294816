//! Count-based join of resolved jobs.

use crate::error::LookupError;
use crate::index::PackageRecord;

use super::ResolvedPackage;
use super::job::{Outcome, ReconciliationJob};

/// What: Collect resolved jobs until every dispatched job has reported.
///
/// Inputs:
/// - `expected`: Number of dispatched jobs.
///
/// Output:
/// - `finish` yields one `ResolvedPackage` per dispatched job, in dispatch order.
///
/// Details:
/// - Completion is purely a count: `resolved == expected`.
/// - Duplicate or unresolved reports are logged and dropped, so a job is
///   never counted twice.
#[derive(Debug)]
pub(super) struct Aggregator {
    /// One outcome slot per job id.
    slots: Vec<Option<Outcome>>,
    /// Number of filled slots.
    resolved: usize,
}

impl Aggregator {
    /// Create an aggregator expecting `expected` jobs.
    pub(super) fn new(expected: usize) -> Self {
        let mut slots = Vec::with_capacity(expected);
        slots.resize_with(expected, || None);
        Self { slots, resolved: 0 }
    }

    /// What: Accept one job from the completion channel.
    ///
    /// Inputs:
    /// - `job`: A job reported by a worker.
    ///
    /// Output:
    /// - `true` if it filled a new slot.
    pub(super) fn record(&mut self, job: ReconciliationJob) -> bool {
        let id = job.id;
        let Some(slot) = self.slots.get_mut(id) else {
            tracing::error!(job = id, "resolved job has an unknown id");
            return false;
        };
        if slot.is_some() {
            tracing::error!(job = id, "job reported more than once; ignoring duplicate");
            return false;
        }
        let Some(outcome) = job.into_outcome() else {
            tracing::error!(job = id, "job reported before it was resolved");
            return false;
        };
        *slot = Some(outcome);
        self.resolved += 1;
        true
    }

    /// Number of distinct jobs resolved so far.
    pub(super) const fn resolved(&self) -> usize {
        self.resolved
    }

    /// `true` once every expected job has been recorded.
    pub(super) const fn is_complete(&self) -> bool {
        self.resolved == self.slots.len()
    }

    /// What: Produce the final per-package results.
    ///
    /// Inputs:
    /// - `records`: The dispatched records, indexed by job id.
    ///
    /// Output:
    /// - One entry per job; slots that never reported become
    ///   `LookupFailed { cause: WorkerLost }`.
    pub(super) fn finish(self, records: Vec<PackageRecord>) -> Vec<ResolvedPackage> {
        self.slots
            .into_iter()
            .zip(records)
            .map(|(slot, record)| {
                let outcome = slot.unwrap_or_else(|| {
                    tracing::warn!(package = %record.name, "job never reported; marking as failed");
                    Outcome::LookupFailed {
                        cause: LookupError::WorkerLost,
                    }
                });
                ResolvedPackage { record, outcome }
            })
            .collect()
    }
}
