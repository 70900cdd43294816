//! Feeds jobs into the bounded work queue.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::job::ReconciliationJob;

/// What: Spawn the dispatcher task.
///
/// Inputs:
/// - `jobs`: Pending jobs in dispatch order.
/// - `queue`: Bounded sender drained by the worker pool.
///
/// Output:
/// - Handle resolving to the number of jobs handed to the queue.
///
/// Details:
/// - `send` waits while the queue is full, which is the pool's backpressure.
/// - Dropping `queue` at the end closes the channel so idle workers exit.
pub(super) fn spawn_dispatcher(
    jobs: Vec<ReconciliationJob>,
    queue: mpsc::Sender<ReconciliationJob>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut sent = 0usize;
        for job in jobs {
            let id = job.id;
            if queue.send(job).await.is_err() {
                tracing::warn!(job = id, sent, "work queue closed before dispatch finished");
                break;
            }
            sent += 1;
        }
        tracing::debug!(sent, "dispatch complete");
        sent
    })
}
