//! CLI command handlers, one per file.

mod enqueue;
mod requeue;
mod run;
mod status;

pub use enqueue::run_enqueue;
pub use requeue::run_requeue;
pub use run::run_worker;
pub use status::run_status;
