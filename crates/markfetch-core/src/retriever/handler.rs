//! Easy2 Handler for one connection slot in the curl multi backend.
//! Carries the slot's current task and buffers the response body.

use crate::task::FetchTask;

/// Per-slot transfer state. Implements curl's Handler for Easy2.
pub struct FetchHandler {
    slot: usize,
    task: Option<FetchTask>,
    body: Vec<u8>,
    bytes_received: u64,
    max_body_bytes: usize,
}

impl FetchHandler {
    pub(super) fn new(slot: usize, max_body_bytes: usize) -> Self {
        Self {
            slot,
            task: None,
            body: Vec::new(),
            bytes_received: 0,
            max_body_bytes,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn task(&self) -> Option<&FetchTask> {
        self.task.as_ref()
    }

    /// Buffered response body (at most `max_body_bytes`).
    #[cfg(test)]
    pub(super) fn body(&self) -> &[u8] {
        &self.body
    }

    /// Total body bytes received, including any discarded past the cap.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    pub(super) fn assign(&mut self, task: FetchTask) {
        self.task = Some(task);
    }

    pub(super) fn take_task(&mut self) -> Option<FetchTask> {
        self.task.take()
    }

    /// Back to idle: no task, empty buffer.
    pub(super) fn reset(&mut self) {
        self.task = None;
        self.body.clear();
        self.bytes_received = 0;
    }
}

impl curl::easy::Handler for FetchHandler {
    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.bytes_received += data.len() as u64;
        let room = self.max_body_bytes.saturating_sub(self.body.len());
        self.body.extend_from_slice(&data[..data.len().min(room)]);
        // Report everything as consumed; anything short of that aborts the transfer.
        Ok(data.len())
    }
}
