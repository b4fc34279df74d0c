//! Drive active transfers and harvest the finished ones.

use curl::easy::Easy2;

use super::handler::FetchHandler;
use super::pool::{ConnectionPool, Finished};
use super::transport;
use crate::task::{Completion, FetchOutcome, FetchTask};

/// Let the multi make progress. libcurl never asks to be called again
/// immediately, so one perform per drive exhausts the available progress.
/// Returns the number of transfers still running.
pub(super) fn drive(pool: &ConnectionPool) -> Result<u32, curl::MultiError> {
    pool.perform()
}

/// Classify a finished transfer. Any response code counts as a response,
/// 4xx/5xx included; only curl errors are transport failures.
///
/// libcurl normalizes the effective URL (`http://host` reads back as
/// `http://host/`), so a redirect is taken from the redirect count rather than
/// from comparing URLs.
pub(super) fn classify(
    easy: &mut Easy2<FetchHandler>,
    result: Result<(), curl::Error>,
) -> FetchOutcome {
    match result {
        Ok(()) => {
            let status = easy.response_code().unwrap_or(0);
            let redirect_url = if easy.redirect_count().unwrap_or(0) > 0 {
                easy.effective_url().ok().flatten().map(str::to_string)
            } else {
                None
            };
            FetchOutcome::Response {
                status,
                redirect_url,
            }
        }
        Err(e) => FetchOutcome::Transport {
            code: e.code() as i32,
            message: transport::error_message(&e),
        },
    }
}

/// Drain every finished transfer, release its handle, and return the outcomes.
pub(super) fn reap(pool: &mut ConnectionPool) -> Vec<Completion> {
    let mut completions = Vec::new();
    for finished in pool.take_finished() {
        let (mut easy, result) = match finished {
            Finished::Done(easy, result) => (easy, result),
            Finished::Lost {
                task,
                bytes_received,
                error,
            } => {
                let completion = lost_completion(task, bytes_received, &error);
                log_outcome(None, &completion.task, &completion.outcome, bytes_received);
                completions.push(completion);
                continue;
            }
        };
        let slot = easy.get_ref().slot();
        let bytes_received = easy.get_ref().bytes_received();
        let Some(task) = easy.get_mut().take_task() else {
            tracing::warn!(slot, "finished handle had no task");
            pool.release(easy);
            continue;
        };
        let outcome = classify(&mut easy, result);
        pool.release(easy);
        log_outcome(Some(slot), &task, &outcome, bytes_received);
        completions.push(Completion {
            task,
            outcome,
            bytes_received,
        });
    }
    completions
}

/// A task whose handle the multi would not give back still gets a status:
/// the multi error code and text, as a transport failure.
fn lost_completion(task: FetchTask, bytes_received: u64, error: &curl::MultiError) -> Completion {
    Completion {
        task,
        outcome: FetchOutcome::Transport {
            code: error.code(),
            message: format!("curl multi remove failed: {}", error),
        },
        bytes_received,
    }
}

fn log_outcome(slot: Option<usize>, task: &FetchTask, outcome: &FetchOutcome, bytes: u64) {
    match outcome {
        FetchOutcome::Response {
            status,
            redirect_url: Some(target),
        } => {
            tracing::info!(slot, url = %task.url, status, redirect = %target, bytes, "fetched");
        }
        FetchOutcome::Response {
            status,
            redirect_url: None,
        } => {
            tracing::info!(slot, url = %task.url, status, bytes, "fetched");
        }
        FetchOutcome::Transport { code, message } => {
            tracing::info!(slot, url = %task.url, code, error = %message, "fetch failed");
        }
    }
}
