//! Main loop: schedule, drive, reap/apply, idle, forever.

use anyhow::{Context, Result};
use std::future::Future;

use super::apply::{apply, Applied};
use super::pool::ConnectionPool;
use super::reap;
use super::schedule::schedule;
use super::transport::{self, HandleSettings};
use crate::config::RetrieverConfig;
use crate::store::{StatusStore, TaskQueue};
use crate::task::Completion;

/// Counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub dispatched: usize,
    /// Transfers that obtained a response.
    pub fetched: usize,
    /// Transfers (or dispatches) that failed at the transport level.
    pub failed: usize,
    /// Status writes that matched no bookmark.
    pub missing: usize,
    /// Transfers still in flight at the end of the cycle.
    pub in_flight: usize,
}

impl CycleReport {
    pub fn did_work(&self) -> bool {
        self.dispatched + self.fetched + self.failed > 0
    }
}

pub struct Retriever<Q, S> {
    cfg: RetrieverConfig,
    queue: Q,
    store: S,
    pool: ConnectionPool,
}

impl<Q: TaskQueue, S: StatusStore> Retriever<Q, S> {
    pub fn new(cfg: RetrieverConfig, queue: Q, store: S) -> Result<Self> {
        cfg.validate().context("invalid retriever config")?;
        transport::ignore_sigpipe();
        curl::init();
        let pool = ConnectionPool::new(cfg.pool_size, HandleSettings::from_config(&cfg))
            .context("building connection pool")?;
        Ok(Self {
            cfg,
            queue,
            store,
            pool,
        })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// One SCHEDULE, DRIVE, REAP/APPLY pass. Failures are logged; the next
    /// cycle simply tries again.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        match schedule(&self.queue, &mut self.pool, self.cfg.batch_size).await {
            Ok(scheduled) => {
                report.dispatched = scheduled.dispatched;
                for completion in &scheduled.rejected {
                    self.record(completion, &mut report).await;
                }
            }
            Err(e) => tracing::warn!(error = %e, "reading task queue failed"),
        }

        if let Err(e) = reap::drive(&self.pool) {
            tracing::warn!(error = %e, "curl multi perform failed");
        }

        for completion in reap::reap(&mut self.pool) {
            self.record(&completion, &mut report).await;
        }

        report.in_flight = self.pool.active_count();
        report
    }

    async fn record(&self, completion: &Completion, report: &mut CycleReport) {
        if completion.is_success() {
            report.fetched += 1;
        } else {
            report.failed += 1;
        }
        if apply(&self.store, completion).await == Applied::Missing {
            report.missing += 1;
        }
    }

    /// Wait for socket readiness (bounded), then sleep the fixed idle interval.
    ///
    /// The readiness wait blocks the thread for up to `select_timeout`. Nothing
    /// else runs on the worker's runtime, so only shutdown can be held up, and
    /// by no more than that.
    pub async fn idle(&self) {
        if let Err(e) = self.pool.wait(self.cfg.select_timeout()) {
            tracing::warn!(error = %e, "curl multi wait failed");
        }
        tokio::time::sleep(self.cfg.idle_sleep()).await;
    }

    /// Run cycles until `shutdown` resolves. Shutdown is observed during the
    /// idle phase; transfers still in flight are dropped.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            pool_size = self.pool.capacity(),
            batch_size = self.cfg.batch_size,
            "retriever started"
        );
        tokio::pin!(shutdown);
        loop {
            let report = self.run_cycle().await;
            if report.did_work() {
                tracing::debug!(
                    dispatched = report.dispatched,
                    fetched = report.fetched,
                    failed = report.failed,
                    missing = report.missing,
                    in_flight = report.in_flight,
                    "cycle finished"
                );
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.idle() => {}
            }
        }
        tracing::info!(
            dropped = self.pool.active_count(),
            "retriever stopped"
        );
    }
}
