//! `markfetch enqueue <owner> <url>` – save a bookmark and queue a fetch.

use anyhow::Result;
use markfetch_core::link_db::LinkDb;

pub async fn run_enqueue(db: &LinkDb, owner: &str, url: &str, title: Option<&str>) -> Result<()> {
    let id = db.enqueue(owner, url, title).await?;
    println!("Queued task {id} for {owner}: {url}");
    Ok(())
}
