//! Bookmark rows: the retriever's status write plus the reads used by the CLI.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::{unix_timestamp, LinkDb};
use super::types::{BookmarkId, BookmarkStatus};
use crate::store::{StatusStore, StatusUpdate, StoreResult};
use crate::task::url_digest;

impl StatusStore for LinkDb {
    async fn update_fields(&self, update: &StatusUpdate) -> StoreResult<u64> {
        let r = sqlx::query(
            r#"
            UPDATE bookmarks
            SET status = ?1,
                redirect_url = ?2,
                error_message = ?3,
                checked_at = ?4
            WHERE url_digest = ?5 AND owner = ?6
            "#,
        )
        .bind(update.status)
        .bind(&update.redirect_url)
        .bind(&update.error_message)
        .bind(unix_timestamp())
        .bind(&update.url_digest)
        .bind(&update.owner)
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected())
    }
}

fn bookmark_from_row(row: &SqliteRow) -> BookmarkStatus {
    BookmarkStatus {
        id: row.get("id"),
        owner: row.get("owner"),
        url: row.get("url"),
        url_digest: row.get("url_digest"),
        title: row.get("title"),
        status: row.get("status"),
        redirect_url: row.get("redirect_url"),
        error_message: row.get("error_message"),
        checked_at: row.get("checked_at"),
    }
}

impl LinkDb {
    /// Insert the bookmark, or update its URL/title if the owner already has it.
    /// Status fields of an existing bookmark are left alone.
    pub async fn save_bookmark(
        &self,
        owner: &str,
        url: &str,
        title: Option<&str>,
    ) -> Result<BookmarkId> {
        let row = sqlx::query(
            r#"
            INSERT INTO bookmarks (owner, url, url_digest, title, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (owner, url_digest) DO UPDATE
            SET url = excluded.url,
                title = COALESCE(excluded.title, bookmarks.title)
            RETURNING id
            "#,
        )
        .bind(owner)
        .bind(url)
        .bind(url_digest(url))
        .bind(title)
        .bind(unix_timestamp())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    pub async fn get_bookmark(&self, owner: &str, url: &str) -> Result<Option<BookmarkStatus>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner, url, url_digest, title, status, redirect_url,
                   error_message, checked_at
            FROM bookmarks
            WHERE owner = ?1 AND url_digest = ?2
            "#,
        )
        .bind(owner)
        .bind(url_digest(url))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(bookmark_from_row))
    }

    /// All bookmarks of `owner`, oldest first.
    pub async fn list_bookmarks(&self, owner: &str) -> Result<Vec<BookmarkStatus>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner, url, url_digest, title, status, redirect_url,
                   error_message, checked_at
            FROM bookmarks
            WHERE owner = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(bookmark_from_row).collect())
    }

    /// Permanently remove a bookmark. Queued tasks for it are left in place;
    /// their status writes will simply match nothing.
    pub async fn remove_bookmark(&self, owner: &str, url: &str) -> Result<u64> {
        let r = sqlx::query("DELETE FROM bookmarks WHERE owner = ?1 AND url_digest = ?2")
            .bind(owner)
            .bind(url_digest(url))
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }
}
