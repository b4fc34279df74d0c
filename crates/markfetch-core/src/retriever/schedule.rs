//! Schedule step: move queued tasks into free connection slots.

use super::pool::ConnectionPool;
use super::transport;
use crate::store::{StoreResult, TaskQueue};
use crate::task::{Completion, FetchOutcome, FetchTask};

/// What one schedule step did.
#[derive(Debug, Default)]
pub struct ScheduleReport {
    /// Tasks read from the queue.
    pub read: usize,
    /// Tasks attached to the multi.
    pub dispatched: usize,
    /// Dequeued tasks curl refused to start; already failed, still to be applied.
    pub rejected: Vec<Completion>,
    /// A queue delete failed and the step stopped early.
    pub aborted: bool,
}

fn rejected(task: FetchTask, code: i32, message: String) -> Completion {
    Completion {
        task,
        outcome: FetchOutcome::Transport { code, message },
        bytes_received: 0,
    }
}

/// Read up to `batch_size` tasks and dispatch as many as there are free handles.
///
/// Each task is deleted from the queue before its request starts, so a task is
/// consumed even if the fetch later fails. Leftover tasks stay queued.
pub(super) async fn schedule<Q: TaskQueue>(
    queue: &Q,
    pool: &mut ConnectionPool,
    batch_size: usize,
) -> StoreResult<ScheduleReport> {
    let mut report = ScheduleReport::default();
    if pool.free_count() == 0 {
        return Ok(report);
    }

    let batch = queue.read_batch(batch_size).await?;
    report.read = batch.len();

    for task in batch {
        let Some(mut easy) = pool.acquire() else {
            break;
        };
        if let Err(e) = queue.delete(task.id).await {
            tracing::warn!(task = task.id, error = %e, "could not dequeue task; retrying next cycle");
            pool.release(easy);
            report.aborted = true;
            break;
        }

        if let Err(e) = easy.url(&task.url) {
            tracing::warn!(url = %task.url, error = %e, "curl rejected URL");
            pool.release(easy);
            let message = transport::error_message(&e);
            report.rejected.push(rejected(task, e.code() as i32, message));
            continue;
        }

        let slot = easy.get_ref().slot();
        easy.get_mut().assign(task.clone());
        match pool.attach(easy) {
            Ok(()) => {
                tracing::info!(slot, url = %task.url, owner = %task.owner, "dispatched fetch");
                report.dispatched += 1;
            }
            Err(e) => {
                tracing::warn!(url = %task.url, error = %e, "curl multi add failed");
                let message = e.description().to_string();
                report.rejected.push(rejected(task, e.code() as i32, message));
            }
        }
    }

    Ok(report)
}
