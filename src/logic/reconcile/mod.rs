//! Concurrent reconciliation of external packages against a registry.
//!
//! A dispatcher task feeds jobs into a bounded queue, a fixed pool of
//! workers drains it, and the caller aggregates resolved jobs until the
//! count matches what was dispatched. Per-job failures stay inside the
//! job's `Outcome`; the run itself cannot fail.

mod aggregate;
mod dispatch;
mod job;
mod worker;


use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{Mutex, mpsc};
use tracing::Instrument;

use crate::index::PackageRecord;
use crate::logic::vercmp::VersionComparator;
use crate::sources::Registry;

pub use job::{JobState, Outcome, ReconciliationJob, decide_outcome};
pub use worker::resolve_record;

use aggregate::Aggregator;
use dispatch::spawn_dispatcher;
use worker::run_worker;

/// Default number of concurrent registry lookups.
pub const DEFAULT_CONCURRENCY: usize = 16;
/// Default per-lookup deadline.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning knobs for one reconciliation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Worker pool size; values below 1 are treated as 1.
    pub concurrency: usize,
    /// Per-lookup deadline; `None` waits indefinitely.
    pub lookup_timeout: Option<Duration>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            lookup_timeout: Some(DEFAULT_LOOKUP_TIMEOUT),
        }
    }
}

/// One external package with its terminal outcome.
#[derive(Debug)]
pub struct ResolvedPackage {
    /// The installed record that was reconciled.
    pub record: PackageRecord,
    /// How it compared to the registry.
    pub outcome: Outcome,
}

/// Completed run: exactly one entry per dispatched package.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Resolved packages in dispatch order.
    pub packages: Vec<ResolvedPackage>,
}

impl Reconciliation {
    /// Number of packages that are current.
    #[must_use]
    pub fn current(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Current))
    }

    /// Number of packages with a newer upstream version.
    #[must_use]
    pub fn outdated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::UpdateAvailable { .. }))
    }

    /// Number of packages whose lookup failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failure)
    }

    /// Count outcomes matching `pred`.
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.packages.iter().filter(|p| pred(&p.outcome)).count()
    }
}

/// What: Reconcile every external package against the registry.
///
/// Inputs:
/// - `external`: External packages to check.
/// - `registry`: Shared remote lookup capability.
/// - `comparator`: Shared version ordering oracle.
/// - `options`: Pool size and per-lookup timeout.
///
/// Output:
/// - `Reconciliation` holding one resolved entry per input record.
///
/// Details:
/// - Returns only after every dispatched job has resolved; nothing partial
///   is ever observable.
/// - A failed lookup never cancels the others.
/// - Jobs are queued through a channel bounded to the pool size, so the
///   dispatcher waits when all workers are busy.
pub async fn reconcile<R, C>(
    external: Vec<PackageRecord>,
    registry: Arc<R>,
    comparator: Arc<C>,
    options: &ReconcileOptions,
) -> Reconciliation
where
    R: Registry,
    C: VersionComparator,
{
    let total = external.len();
    if total == 0 {
        tracing::info!("no external packages to reconcile");
        return Reconciliation::default();
    }
    let workers = options.concurrency.clamp(1, total);
    let span = tracing::info_span!("reconcile", jobs = total, workers);
    run_pool(external, registry, comparator, workers, options.lookup_timeout)
        .instrument(span)
        .await
}

/// What: Dispatch, work, and aggregate one non-empty batch.
///
/// Inputs:
/// - `external`: Records to reconcile (non-empty); shared with every job.
/// - `registry`, `comparator`: Shared collaborators.
/// - `workers`: Pool size, already clamped to `1..=external.len()`.
/// - `timeout`: Per-lookup deadline.
///
/// Output:
/// - Completed `Reconciliation`.
async fn run_pool<R, C>(
    external: Vec<PackageRecord>,
    registry: Arc<R>,
    comparator: Arc<C>,
    workers: usize,
    timeout: Option<Duration>,
) -> Reconciliation
where
    R: Registry,
    C: VersionComparator,
{
    let total = external.len();
    let started = std::time::Instant::now();

    let batch = Arc::new(external);
    let jobs = ReconciliationJob::for_batch(&batch);

    let (queue_tx, queue_rx) = mpsc::channel(workers);
    let (done_tx, mut done_rx) = mpsc::channel(total);
    let queue: worker::SharedQueue = Arc::new(Mutex::new(queue_rx));

    let pool: Vec<_> = (0..workers)
        .map(|n| {
            tokio::spawn(run_worker(
                n,
                Arc::clone(&queue),
                done_tx.clone(),
                Arc::clone(&registry),
                Arc::clone(&comparator),
                timeout,
            ))
        })
        .collect();
    drop(queue);
    drop(done_tx);
    let dispatcher = spawn_dispatcher(jobs, queue_tx);

    let mut aggregator = Aggregator::new(total);
    while !aggregator.is_complete() {
        let Some(job) = done_rx.recv().await else {
            tracing::warn!(
                resolved = aggregator.resolved(),
                expected = total,
                "all workers exited before every job reported"
            );
            break;
        };
        aggregator.record(job);
    }

    match dispatcher.await {
        Ok(sent) if sent != total => {
            tracing::warn!(sent, expected = total, "dispatcher stopped early");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "dispatcher task failed"),
    }
    for (n, handle) in join_all(pool).await.into_iter().enumerate() {
        if let Err(e) = handle {
            tracing::error!(worker = n, error = %e, "reconciliation worker panicked");
        }
    }

    drop(done_rx);
    let records = Arc::try_unwrap(batch).unwrap_or_else(|shared| {
        tracing::warn!("reconciliation jobs outlived the pool; copying records");
        shared.as_ref().clone()
    });
    let result = Reconciliation {
        packages: aggregator.finish(records),
    };
    tracing::info!(
        current = result.current(),
        outdated = result.outdated(),
        failed = result.failed(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "reconciliation complete"
    );
    result
}
