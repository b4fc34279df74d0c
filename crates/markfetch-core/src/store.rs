//! Storage seams consumed by the retriever.
//!
//! The task queue and the bookmark records belong to the bookmark application;
//! the retriever only pops tasks and writes status fields back.

use thiserror::Error;

use crate::task::{FetchTask, TaskId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Status fields written to the bookmark matching `(url_digest, owner)`.
///
/// `None` clears the field, so each update fully replaces the previous outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub url_digest: String,
    pub owner: String,
    /// HTTP status on success, libcurl error code on transport failure.
    pub status: i64,
    pub redirect_url: Option<String>,
    pub error_message: Option<String>,
}

/// Pending fetch tasks. No ordering contract beyond eventually returning every
/// task that has not been deleted.
#[allow(async_fn_in_trait)]
pub trait TaskQueue {
    async fn read_batch(&self, limit: usize) -> StoreResult<Vec<FetchTask>>;

    async fn delete(&self, id: TaskId) -> StoreResult<()>;
}

/// Bookmark status fields.
#[allow(async_fn_in_trait)]
pub trait StatusStore {
    /// Applies the update and returns the number of bookmarks matched.
    /// Zero is not an error: the bookmark may have been deleted meanwhile.
    async fn update_fields(&self, update: &StatusUpdate) -> StoreResult<u64>;
}
