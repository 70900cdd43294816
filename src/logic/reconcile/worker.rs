//! Worker pool members: claim a job, look it up, compare, report.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Mutex, mpsc};

use crate::error::LookupError;
use crate::index::PackageRecord;
use crate::logic::vercmp::VersionComparator;
use crate::sources::Registry;

use super::job::{Outcome, ReconciliationJob, decide_outcome};

/// Receiving half of the work queue, shared by all workers.
pub(super) type SharedQueue = Arc<Mutex<mpsc::Receiver<ReconciliationJob>>>;

/// What: Reconcile one package record.
///
/// Inputs:
/// - `record`: External package.
/// - `registry`: Remote lookup capability.
/// - `comparator`: Version ordering oracle.
/// - `timeout`: Optional deadline for the lookup.
///
/// Output:
/// - The job's `Outcome`; never an error.
///
/// Details:
/// - A lookup that outlives `timeout` becomes `LookupFailed { cause: Timeout }`.
pub async fn resolve_record<R, C>(
    record: &PackageRecord,
    registry: &R,
    comparator: &C,
    timeout: Option<Duration>,
) -> Outcome
where
    R: Registry,
    C: VersionComparator + ?Sized,
{
    let lookup = registry.lookup(&record.name);
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, lookup)
            .await
            .unwrap_or(Err(LookupError::Timeout)),
        None => lookup.await,
    };
    match result {
        Ok(remote) => decide_outcome(&record.version, &remote.version, comparator),
        Err(cause) => {
            tracing::debug!(package = %record.name, error = %cause, "registry lookup failed");
            Outcome::LookupFailed { cause }
        }
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// What: Run one pool worker until the queue is drained and closed.
///
/// Inputs:
/// - `worker`: Worker index, for logs.
/// - `queue`: Shared receiver of pending jobs.
/// - `done`: Completion channel to the aggregator.
/// - `registry`, `comparator`, `timeout`: Passed through to `resolve_record`.
///
/// Output:
/// - Number of jobs this worker resolved.
///
/// Details:
/// - The queue lock is held only while waiting for the next job, never during
///   a lookup, so workers run their lookups concurrently.
/// - A panic inside a lookup or comparison resolves that job as
///   `LookupFailed { cause: Panicked }`; the worker keeps draining the queue.
pub(super) async fn run_worker<R, C>(
    worker: usize,
    queue: SharedQueue,
    done: mpsc::Sender<ReconciliationJob>,
    registry: Arc<R>,
    comparator: Arc<C>,
    timeout: Option<Duration>,
) -> usize
where
    R: Registry,
    C: VersionComparator,
{
    let mut handled = 0usize;
    loop {
        let next = queue.lock().await.recv().await;
        let Some(mut job) = next else {
            break;
        };
        if !job.claim() {
            tracing::error!(worker, job = job.id, "received a job that was not pending");
            continue;
        }
        let lookup = resolve_record(job.record(), registry.as_ref(), comparator.as_ref(), timeout);
        let outcome = AssertUnwindSafe(lookup)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    worker,
                    job = job.id,
                    package = %job.record().name,
                    panic = %message,
                    "registry lookup panicked"
                );
                Outcome::LookupFailed {
                    cause: LookupError::Panicked(message),
                }
            });
        if job.resolve(outcome).is_err() {
            tracing::error!(worker, job = job.id, "job resolved twice");
            continue;
        }
        handled += 1;
        if done.send(job).await.is_err() {
            tracing::warn!(worker, "aggregator gone; stopping worker");
            break;
        }
    }
    tracing::trace!(worker, handled, "worker finished");
    handled
}
