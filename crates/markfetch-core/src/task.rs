//! Fetch task model and the URL digest shared with the bookmark application.

use md5::{Digest, Md5};

/// Queue row identifier.
pub type TaskId = i64;

/// One URL to fetch on behalf of one bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub id: TaskId,
    pub url: String,
    pub owner: String,
    /// URL digest of the owning bookmark (see [`url_digest`]).
    pub bookmark: String,
}

/// Lowercase hex MD5 of the URL, the key bookmarks are stored under per owner.
pub fn url_digest(url: &str) -> String {
    hex::encode(Md5::digest(url.as_bytes()))
}

/// Outcome of one finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A response was obtained (any status, including 4xx/5xx).
    /// `redirect_url` is the final URL, set only when at least one redirect
    /// was followed.
    Response {
        status: u32,
        redirect_url: Option<String>,
    },
    /// The transfer failed before a response was obtained.
    Transport { code: i32, message: String },
}

/// A finished task and what happened to it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub task: FetchTask,
    pub outcome: FetchOutcome,
    pub bytes_received: u64,
}

impl Completion {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Response { .. })
    }
}
