//! CLI for the markfetch link-retrieval worker.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use markfetch_core::config;
use markfetch_core::link_db::LinkDb;
use std::path::PathBuf;

use commands::{run_enqueue, run_requeue, run_status, run_worker};

/// Top-level CLI for the markfetch worker.
#[derive(Debug, Parser)]
#[command(name = "markfetch")]
#[command(about = "markfetch: checks bookmarked links and records their HTTP status", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/markfetch/config.toml (must exist).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the retriever loop until interrupted (SIGINT/SIGTERM).
    Run,

    /// Save a bookmark and queue a fetch for it.
    Enqueue {
        /// Owner of the bookmark.
        owner: String,
        /// Absolute http/https URL.
        url: String,
        /// Optional bookmark title.
        #[arg(long)]
        title: Option<String>,
    },

    /// Queue a fetch for every bookmark of an owner.
    Requeue {
        /// Owner whose bookmarks are re-checked.
        owner: String,
        /// Only bookmarks never checked, failed, or answering 4xx/5xx.
        #[arg(long)]
        failed_only: bool,
    },

    /// Show pending tasks and, for an owner, each bookmark's last status.
    Status {
        /// Owner whose bookmarks are listed.
        owner: Option<String>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match cli.config {
            Some(ref path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);
        let db = LinkDb::open(&cfg).await?;

        match cli.command {
            CliCommand::Run => run_worker(&db, &cfg).await?,
            CliCommand::Enqueue { owner, url, title } => {
                run_enqueue(&db, &owner, &url, title.as_deref()).await?
            }
            CliCommand::Requeue { owner, failed_only } => {
                run_requeue(&db, &owner, failed_only).await?
            }
            CliCommand::Status { owner } => run_status(&db, owner.as_deref()).await?,
        }

        Ok(())
    }
}
