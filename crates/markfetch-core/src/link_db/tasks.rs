//! Task queue operations: the retriever's read/delete side plus enqueue helpers.

use anyhow::{bail, Context, Result};
use sqlx::Row;

use super::db::{unix_timestamp, LinkDb};
use crate::store::{StoreResult, TaskQueue};
use crate::task::{url_digest, FetchTask, TaskId};

impl TaskQueue for LinkDb {
    async fn read_batch(&self, limit: usize) -> StoreResult<Vec<FetchTask>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, owner, bookmark
            FROM tasks
            ORDER BY id ASC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FetchTask {
                id: row.get("id"),
                url: row.get("url"),
                owner: row.get("owner"),
                bookmark: row.get("bookmark"),
            })
            .collect())
    }

    async fn delete(&self, id: TaskId) -> StoreResult<()> {
        sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl LinkDb {
    /// Save (or update) the owner's bookmark for `url` and queue a fetch for it.
    /// Only absolute http/https URLs are accepted.
    pub async fn enqueue(&self, owner: &str, url: &str, title: Option<&str>) -> Result<TaskId> {
        let parsed = url::Url::parse(url).with_context(|| format!("invalid URL {url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("unsupported URL scheme {:?}", parsed.scheme());
        }
        self.save_bookmark(owner, url, title).await?;
        self.push_task(owner, url).await
    }

    /// Insert a task row for an existing bookmark URL.
    pub async fn push_task(&self, owner: &str, url: &str) -> Result<TaskId> {
        let id = sqlx::query(
            r#"
            INSERT INTO tasks (url, owner, bookmark, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(url)
        .bind(owner)
        .bind(url_digest(url))
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Queue a fetch for every bookmark of `owner`. With `failed_only`, only
    /// bookmarks that were never checked, failed, or answered 4xx/5xx.
    /// Returns the number of tasks queued.
    pub async fn requeue_owner(&self, owner: &str, failed_only: bool) -> Result<u64> {
        let bookmarks = self.list_bookmarks(owner).await?;
        let mut tx = self.pool.begin().await?;
        let now = unix_timestamp();
        let mut queued = 0u64;
        for b in bookmarks.iter().filter(|b| !failed_only || b.needs_recheck()) {
            sqlx::query(
                r#"
                INSERT INTO tasks (url, owner, bookmark, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&b.url)
            .bind(&b.owner)
            .bind(&b.url_digest)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            queued += 1;
        }
        tx.commit().await?;
        Ok(queued)
    }

    /// Number of tasks still waiting in the queue.
    pub async fn pending_tasks(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}
