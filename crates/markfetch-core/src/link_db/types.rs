//! Row types read from the link database.

/// Bookmark row identifier.
pub type BookmarkId = i64;

/// Bookmark with its last retrieval outcome, used by the CLI `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkStatus {
    pub id: BookmarkId,
    pub owner: String,
    pub url: String,
    pub url_digest: String,
    pub title: Option<String>,
    /// None until the retriever has fetched the link once.
    pub status: Option<i64>,
    pub redirect_url: Option<String>,
    pub error_message: Option<String>,
    pub checked_at: Option<i64>,
}

impl BookmarkStatus {
    /// Never checked, failed at the transport level, or answered with 4xx/5xx.
    pub fn needs_recheck(&self) -> bool {
        match self.status {
            None => true,
            Some(_) if self.error_message.is_some() => true,
            Some(code) => code >= 400,
        }
    }
}
