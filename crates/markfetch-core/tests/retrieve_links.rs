//! Integration test: local HTTP server plus an on-disk link database, driven
//! through full retriever cycles.

mod common;

use markfetch_core::config::RetrieverConfig;
use markfetch_core::link_db::LinkDb;
use markfetch_core::retriever::{CycleReport, Retriever};
use tempfile::tempdir;

fn test_config(pool_size: usize) -> RetrieverConfig {
    RetrieverConfig {
        pool_size,
        connect_timeout_secs: 1,
        request_timeout_secs: 1,
        select_timeout_ms: 50,
        idle_sleep_ms: 0,
        ..RetrieverConfig::default()
    }
}

/// Run cycles until the queue is empty and nothing is in flight.
async fn drain(retriever: &mut Retriever<LinkDb, LinkDb>) -> CycleReport {
    let mut total = CycleReport::default();
    for _ in 0..400 {
        let r = retriever.run_cycle().await;
        total.dispatched += r.dispatched;
        total.fetched += r.fetched;
        total.failed += r.failed;
        total.missing += r.missing;
        let pending = retriever.queue().pending_tasks().await.unwrap();
        if pending == 0 && r.in_flight == 0 {
            return total;
        }
        retriever.idle().await;
    }
    panic!("retriever did not drain the queue");
}

async fn open_db() -> (tempfile::TempDir, LinkDb) {
    let dir = tempdir().unwrap();
    let db = LinkDb::open_at(dir.path().join("links.db")).await.unwrap();
    (dir, db)
}

#[tokio::test]
async fn statuses_and_redirects_are_recorded() {
    let base = common::link_server::start();
    let (_dir, db) = open_db().await;
    let a = format!("{}a", base);
    let ok = format!("{}ok", base);
    let missing = format!("{}missing", base);
    for url in [&a, &ok, &missing] {
        db.enqueue("alice", url, None).await.unwrap();
    }

    let mut retriever = Retriever::new(test_config(10), db.clone(), db.clone()).unwrap();
    let first = retriever.run_cycle().await;
    assert_eq!(first.dispatched, 3, "all tasks fit in one schedule step");
    assert_eq!(db.pending_tasks().await.unwrap(), 0);

    let rest = drain(&mut retriever).await;
    assert_eq!(first.fetched + rest.fetched, 3);
    assert_eq!(first.failed + rest.failed, 0);

    let redirected = db.get_bookmark("alice", &a).await.unwrap().unwrap();
    assert_eq!(redirected.status, Some(200));
    assert_eq!(redirected.redirect_url, Some(format!("{}b", base)));
    assert_eq!(redirected.error_message, None);

    let plain = db.get_bookmark("alice", &ok).await.unwrap().unwrap();
    assert_eq!(plain.status, Some(200));
    assert_eq!(plain.redirect_url, None);

    let not_found = db.get_bookmark("alice", &missing).await.unwrap().unwrap();
    assert_eq!(not_found.status, Some(404));
    assert_eq!(not_found.error_message, None);

    let pool = retriever.pool();
    assert_eq!(pool.free_count(), pool.capacity());
}

#[tokio::test]
async fn url_without_path_is_not_recorded_as_redirect() {
    let base = common::link_server::start();
    let (_dir, db) = open_db().await;
    let bare = base.trim_end_matches('/').to_string();
    db.enqueue("alice", &bare, None).await.unwrap();

    let mut retriever = Retriever::new(test_config(2), db.clone(), db.clone()).unwrap();
    let report = drain(&mut retriever).await;
    assert_eq!(report.fetched, 1);

    let b = db.get_bookmark("alice", &bare).await.unwrap().unwrap();
    assert_eq!(b.status, Some(404));
    assert_eq!(b.redirect_url, None);
    assert_eq!(b.error_message, None);
}

#[tokio::test]
async fn timeout_is_recorded_as_transport_error() {
    let base = common::link_server::start();
    let (_dir, db) = open_db().await;
    let slow = format!("{}slow", base);
    db.enqueue("alice", &slow, None).await.unwrap();

    let mut retriever = Retriever::new(test_config(2), db.clone(), db.clone()).unwrap();
    let report = drain(&mut retriever).await;
    assert_eq!(report.failed, 1);

    let b = db.get_bookmark("alice", &slow).await.unwrap().unwrap();
    assert_eq!(b.status, Some(28));
    let message = b.error_message.expect("error message recorded");
    assert!(message.starts_with("Timeout"), "unexpected message: {message}");
    assert_eq!(b.redirect_url, None);
}

#[tokio::test]
async fn refused_connection_and_redirect_loop_fail_without_stalling() {
    let base = common::link_server::start();
    let (_dir, db) = open_db().await;
    let refused = common::link_server::refused_url();
    let looping = format!("{}loop", base);
    let ok = format!("{}ok", base);
    for url in [&refused, &looping, &ok] {
        db.enqueue("alice", url, None).await.unwrap();
    }

    let mut retriever = Retriever::new(test_config(3), db.clone(), db.clone()).unwrap();
    let report = drain(&mut retriever).await;
    assert_eq!(report.failed, 2);
    assert_eq!(report.fetched, 1);

    let r = db.get_bookmark("alice", &refused).await.unwrap().unwrap();
    assert_eq!(r.status, Some(7));
    assert!(r.error_message.is_some());

    let l = db.get_bookmark("alice", &looping).await.unwrap().unwrap();
    assert_eq!(l.status, Some(47));
    assert!(l.error_message.is_some());

    let o = db.get_bookmark("alice", &ok).await.unwrap().unwrap();
    assert_eq!(o.status, Some(200));
}

#[tokio::test]
async fn deleted_bookmark_update_is_a_noop() {
    let base = common::link_server::start();
    let (_dir, db) = open_db().await;
    let ok = format!("{}ok", base);
    db.enqueue("alice", &ok, None).await.unwrap();
    db.remove_bookmark("alice", &ok).await.unwrap();

    let mut retriever = Retriever::new(test_config(2), db.clone(), db.clone()).unwrap();
    let report = drain(&mut retriever).await;
    assert_eq!(report.fetched, 1);
    assert_eq!(report.missing, 1);
    assert!(db.get_bookmark("alice", &ok).await.unwrap().is_none());
    assert!(db.list_bookmarks("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn pool_capacity_bounds_dispatch_and_leftovers_stay_queued() {
    let base = common::link_server::start();
    let (_dir, db) = open_db().await;
    let urls: Vec<String> = (0..5).map(|i| format!("{}ok?n={}", base, i)).collect();
    for url in &urls {
        db.enqueue("alice", url, None).await.unwrap();
    }

    let mut retriever = Retriever::new(test_config(2), db.clone(), db.clone()).unwrap();
    let first = retriever.run_cycle().await;
    assert_eq!(first.dispatched, 2);
    assert_eq!(db.pending_tasks().await.unwrap(), 3);
    let pool = retriever.pool();
    assert_eq!(pool.free_count() + pool.active_count(), pool.capacity());

    drain(&mut retriever).await;
    for url in &urls {
        let b = db.get_bookmark("alice", url).await.unwrap().unwrap();
        assert_eq!(b.status, Some(200));
    }
}

#[tokio::test]
async fn run_returns_when_shutdown_resolves() {
    let (_dir, db) = open_db().await;
    let mut retriever = Retriever::new(test_config(1), db.clone(), db.clone()).unwrap();
    let shutdown = tokio::time::sleep(std::time::Duration::from_millis(200));
    tokio::time::timeout(std::time::Duration::from_secs(5), retriever.run(shutdown))
        .await
        .expect("run stops after shutdown");
}
