//! `markfetch status [owner]` – queue depth and per-bookmark outcomes.

use anyhow::Result;
use markfetch_core::link_db::{BookmarkStatus, LinkDb};

fn outcome(b: &BookmarkStatus) -> String {
    match (b.status, &b.error_message, &b.redirect_url) {
        (None, _, _) => "unchecked".to_string(),
        (Some(code), Some(err), _) => format!("error {code}: {err}"),
        (Some(code), None, Some(to)) => format!("{code} -> {to}"),
        (Some(code), None, None) => format!("{code}"),
    }
}

pub async fn run_status(db: &LinkDb, owner: Option<&str>) -> Result<()> {
    let pending = db.pending_tasks().await?;
    println!("Pending tasks: {pending}");

    let Some(owner) = owner else {
        return Ok(());
    };
    let bookmarks = db.list_bookmarks(owner).await?;
    if bookmarks.is_empty() {
        println!("No bookmarks for {owner}.");
        return Ok(());
    }
    println!("{:<6} {:<40} {}", "ID", "STATUS", "URL");
    for b in bookmarks {
        println!("{:<6} {:<40} {}", b.id, outcome(&b), b.url);
    }
    Ok(())
}
