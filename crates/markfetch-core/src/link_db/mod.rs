//! SQLite link database (via sqlx) shared with the bookmark application.
//!
//! Holds the `bookmarks` table the retriever reports status into and the
//! `tasks` queue it drains.

mod bookmarks;
mod db;
mod tasks;
mod types;

pub use db::*;
pub use types::*;
