//! Fixed-size pool of reusable easy handles attached to one curl multi handle.
//!
//! Every handle is either in `free` or attached to the multi in `active`;
//! `free + active == capacity` holds between calls.

use std::time::Duration;

use curl::easy::Easy2;
use curl::multi::{Easy2Handle, Multi};

use super::handler::FetchHandler;
use super::transport::{self, HandleSettings};
use crate::task::FetchTask;

/// A transfer the multi reported as finished.
pub(super) enum Finished {
    /// Handle detached from the multi, with the transfer result.
    Done(Easy2<FetchHandler>, Result<(), curl::Error>),
    /// The multi failed to detach the handle; only the task survives.
    Lost {
        task: FetchTask,
        bytes_received: u64,
        error: curl::MultiError,
    },
}

pub struct ConnectionPool {
    active: Vec<Easy2Handle<FetchHandler>>,
    free: Vec<Easy2<FetchHandler>>,
    multi: Multi,
    settings: HandleSettings,
    capacity: usize,
    next_slot: usize,
}

impl ConnectionPool {
    pub fn new(capacity: usize, settings: HandleSettings) -> Result<Self, curl::Error> {
        let mut free = Vec::with_capacity(capacity);
        for slot in 0..capacity {
            free.push(transport::new_handle(slot, &settings)?);
        }
        Ok(Self {
            active: Vec::with_capacity(capacity),
            free,
            multi: Multi::new(),
            settings,
            capacity,
            next_slot: capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Take an idle handle, or None when every handle is busy.
    pub fn acquire(&mut self) -> Option<Easy2<FetchHandler>> {
        self.free.pop()
    }

    /// Return a handle to the free set, clearing its task and buffer.
    pub fn release(&mut self, mut easy: Easy2<FetchHandler>) {
        easy.get_mut().reset();
        self.free.push(easy);
        debug_assert!(self.free.len() + self.active.len() <= self.capacity);
    }

    /// Hand an acquired, configured handle to the multi.
    pub fn attach(&mut self, easy: Easy2<FetchHandler>) -> Result<(), curl::MultiError> {
        match self.multi.add2(easy) {
            Ok(handle) => {
                self.active.push(handle);
                Ok(())
            }
            Err(e) => {
                self.replace_lost_handle();
                Err(e)
            }
        }
    }

    /// Let the multi make progress on every active transfer without blocking.
    /// Returns the number of transfers still running.
    pub fn perform(&self) -> Result<u32, curl::MultiError> {
        self.multi.perform()
    }

    /// Block until a socket is ready or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Result<u32, curl::MultiError> {
        self.multi.wait(&mut [], timeout)
    }

    /// Drain the multi's completion messages and detach every finished handle.
    pub(super) fn take_finished(&mut self) -> Vec<Finished> {
        let mut done: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
        let active = &self.active;
        self.multi.messages(|msg| {
            for (i, handle) in active.iter().enumerate() {
                if let Some(result) = msg.result_for2(handle) {
                    done.push((i, result));
                    break;
                }
            }
        });
        done.sort_by(|a, b| b.0.cmp(&a.0));

        let mut out = Vec::with_capacity(done.len());
        for (i, result) in done {
            let mut handle = self.active.remove(i);
            // remove2 drops the handle on error, so the task comes out first.
            let task = handle.get_mut().take_task();
            let bytes_received = handle.get_ref().bytes_received();
            match self.multi.remove2(handle) {
                Ok(mut easy) => {
                    if let Some(task) = task {
                        easy.get_mut().assign(task);
                    }
                    out.push(Finished::Done(easy, result));
                }
                Err(error) => {
                    tracing::error!(error = %error, "curl multi remove failed; handle lost");
                    self.replace_lost_handle();
                    if let Some(task) = task {
                        out.push(Finished::Lost {
                            task,
                            bytes_received,
                            error,
                        });
                    }
                }
            }
        }
        out
    }

    /// A handle consumed by a failed multi add/remove is replaced so the pool
    /// keeps its size. If even that fails, capacity shrinks by one.
    fn replace_lost_handle(&mut self) {
        let slot = self.next_slot;
        self.next_slot += 1;
        match transport::new_handle(slot, &self.settings) {
            Ok(easy) => self.free.push(easy),
            Err(e) => {
                tracing::error!(error = %e, "could not rebuild connection handle");
                self.capacity -= 1;
            }
        }
    }

    /// Detach up to `n` active transfers without completing them.
    #[cfg(test)]
    pub(super) fn abandon_active(&mut self, n: usize) -> Vec<FetchTask> {
        let mut tasks = Vec::new();
        for _ in 0..n.min(self.active.len()) {
            let handle = self.active.pop().expect("active handle");
            let mut easy = self.multi.remove2(handle).expect("remove2");
            if let Some(task) = easy.get_mut().take_task() {
                tasks.push(task);
            }
            self.release(easy);
        }
        tasks
    }
}
