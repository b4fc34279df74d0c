//! `markfetch requeue <owner>` – re-check an owner's bookmarks.

use anyhow::Result;
use markfetch_core::link_db::LinkDb;

pub async fn run_requeue(db: &LinkDb, owner: &str, failed_only: bool) -> Result<()> {
    let n = db.requeue_owner(owner, failed_only).await?;
    if n == 0 {
        println!("Nothing to requeue for {owner}.");
    } else {
        println!("Queued {n} task(s) for {owner}.");
    }
    Ok(())
}
