//! Write each completion back to its bookmark.

use crate::store::{StatusStore, StatusUpdate};
use crate::task::{Completion, FetchOutcome};

impl StatusUpdate {
    /// The single status write for a finished task.
    pub fn from_completion(completion: &Completion) -> Self {
        let task = &completion.task;
        let (status, redirect_url, error_message) = match &completion.outcome {
            FetchOutcome::Response {
                status,
                redirect_url,
            } => (i64::from(*status), redirect_url.clone(), None),
            FetchOutcome::Transport { code, message } => {
                (i64::from(*code), None, Some(message.clone()))
            }
        };
        StatusUpdate {
            url_digest: task.bookmark.clone(),
            owner: task.owner.clone(),
            status,
            redirect_url,
            error_message,
        }
    }
}

/// How a status write went. Never an error for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    /// No bookmark matched; it was deleted after the task was queued.
    Missing,
    /// The store rejected the write; logged and dropped.
    Failed,
}

pub(super) async fn apply<S: StatusStore>(store: &S, completion: &Completion) -> Applied {
    let update = StatusUpdate::from_completion(completion);
    match store.update_fields(&update).await {
        Ok(0) => {
            tracing::debug!(url = %completion.task.url, owner = %update.owner, "bookmark gone; status dropped");
            Applied::Missing
        }
        Ok(_) => Applied::Updated,
        Err(e) => {
            tracing::warn!(url = %completion.task.url, owner = %update.owner, error = %e, "status update failed");
            Applied::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StoreError, StoreResult};
    use crate::task::{url_digest, FetchTask};
    use std::cell::RefCell;

    fn completion(url: &str, outcome: FetchOutcome) -> Completion {
        Completion {
            task: FetchTask {
                id: 1,
                url: url.to_string(),
                owner: "alice".to_string(),
                bookmark: url_digest(url),
            },
            outcome,
            bytes_received: 0,
        }
    }

    #[test]
    fn redirect_target_is_written() {
        let c = completion(
            "http://example.com/a",
            FetchOutcome::Response {
                status: 200,
                redirect_url: Some("http://example.com/b".to_string()),
            },
        );
        let u = StatusUpdate::from_completion(&c);
        assert_eq!(u.status, 200);
        assert_eq!(u.redirect_url.as_deref(), Some("http://example.com/b"));
        assert_eq!(u.error_message, None);
        assert_eq!(u.url_digest, url_digest("http://example.com/a"));
        assert_eq!(u.owner, "alice");
    }

    #[test]
    fn plain_response_clears_redirect() {
        let c = completion(
            "http://example.com/a",
            FetchOutcome::Response {
                status: 404,
                redirect_url: None,
            },
        );
        let u = StatusUpdate::from_completion(&c);
        assert_eq!(u.status, 404);
        assert!(u.redirect_url.is_none());
    }

    #[test]
    fn transport_failure_sets_code_and_message() {
        let c = completion(
            "http://example.com/slow",
            FetchOutcome::Transport {
                code: 28,
                message: "Timeout was reached".to_string(),
            },
        );
        let u = StatusUpdate::from_completion(&c);
        assert_eq!(u.status, 28);
        assert_eq!(u.error_message.as_deref(), Some("Timeout was reached"));
        assert!(u.redirect_url.is_none());
    }

    struct RecordingStore {
        matched: u64,
        fail: bool,
        seen: RefCell<Vec<StatusUpdate>>,
    }

    impl StatusStore for RecordingStore {
        async fn update_fields(&self, update: &StatusUpdate) -> StoreResult<u64> {
            self.seen.borrow_mut().push(update.clone());
            if self.fail {
                return Err(StoreError::Unavailable("down".to_string()));
            }
            Ok(self.matched)
        }
    }

    #[tokio::test]
    async fn apply_swallows_missing_and_failing_writes() {
        let c = completion(
            "http://example.com/a",
            FetchOutcome::Response {
                status: 200,
                redirect_url: None,
            },
        );
        let store = RecordingStore {
            matched: 1,
            fail: false,
            seen: RefCell::new(Vec::new()),
        };
        assert_eq!(apply(&store, &c).await, Applied::Updated);
        assert_eq!(store.seen.borrow().len(), 1);

        let gone = RecordingStore {
            matched: 0,
            fail: false,
            seen: RefCell::new(Vec::new()),
        };
        assert_eq!(apply(&gone, &c).await, Applied::Missing);

        let down = RecordingStore {
            matched: 0,
            fail: true,
            seen: RefCell::new(Vec::new()),
        };
        assert_eq!(apply(&down, &c).await, Applied::Failed);
        assert_eq!(down.seen.borrow().len(), 1);
    }
}
