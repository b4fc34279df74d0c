pub mod config;
pub mod logging;

pub mod link_db;
pub mod retriever;
pub mod store;
pub mod task;
