//! Link retriever: a single-threaded curl multi loop that drains the task
//! queue into a fixed pool of connection handles and writes each outcome back
//! to the bookmark store.
//!
//! One cycle is SCHEDULE, DRIVE, REAP/APPLY, followed by an IDLE wait.

mod apply;
mod handler;
mod pool;
mod reap;
mod run;
mod schedule;
mod transport;

pub use apply::Applied;
pub use handler::FetchHandler;
pub use pool::ConnectionPool;
pub use run::{CycleReport, Retriever};
pub use schedule::ScheduleReport;
pub use transport::{ignore_sigpipe, HandleSettings};
