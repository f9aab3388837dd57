// src/cli.rs
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::options::{AppOptions, FailurePolicy, WorkMode};
use crate::core::net::HttpFetcher;
use crate::error::Result;
use crate::progress::LogProgress;
use crate::runner::{self, Orchestrator};
use crate::store::Store;

/// Rebuild the full-archive podcast feed from the website.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding raw.csv, transformed.csv and missing.csv
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding item.xml and feed.xml
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    /// Where the rendered feed goes
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// More logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch missing episodes, then transform and render (default)
    Run(RunArgs),
    /// Create any missing table as an empty one
    Init,
    /// Transform and render from the stored tables only; no network
    Render,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Re-fetch every published episode
    #[arg(long, conflicts_with = "backfill")]
    pub refresh: bool,

    /// Fetch every gap up to the newest episode, and re-check temporary download links
    #[arg(long)]
    pub backfill: bool,

    /// Do not record failures whose message is empty
    #[arg(long)]
    pub skip_empty_failures: bool,

    #[arg(long)]
    pub feed_url: Option<String>,

    /// Episode page URL, `{num}` is replaced by the episode number
    #[arg(long)]
    pub episode_url: Option<String>,

    /// Pause between requests, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

impl Cli {
    /// Layer the flags over the defaults.
    pub fn options(&self) -> AppOptions {
        let mut opts = AppOptions::default();

        if let Some(dir) = &self.data_dir {
            opts.store.data_dir = dir.clone();
        }
        if let Some(dir) = &self.templates {
            opts.output.template_dir = dir.clone();
        }
        if let Some(out) = &self.output {
            opts.output.out_path = out.clone();
        }

        if let Some(Command::Run(args)) = &self.command {
            opts.run.mode = if args.refresh {
                WorkMode::Refresh
            } else if args.backfill {
                WorkMode::Backfill
            } else {
                WorkMode::Feed
            };
            if args.skip_empty_failures {
                opts.run.failure_policy = FailurePolicy::SkipEmptyMessages;
            }
            if let Some(url) = &args.feed_url {
                opts.fetch.feed_url = url.clone();
            }
            if let Some(url) = &args.episode_url {
                opts.fetch.episode_url = url.clone();
            }
            if let Some(ms) = args.delay_ms {
                opts.fetch.request_pause = Duration::from_millis(ms);
            }
        }
        opts
    }
}

pub fn run(cli: Cli) -> Result<()> {
    crate::log::init(cli.verbose);
    let opts = cli.options();

    match cli.command.unwrap_or(Command::Run(RunArgs::default())) {
        Command::Init => {
            let created = Store::new(opts.store.clone()).init()?;
            if created.is_empty() {
                info!("all tables already exist");
            }
        }
        Command::Render => {
            let n = runner::render_only(&opts, Utc::now())?;
            info!(episodes = n, "rendered");
        }
        Command::Run(_) => {
            let fetcher = HttpFetcher::new(opts.fetch.clone())?;
            let mut progress = LogProgress::default();
            let summary = Orchestrator::new(&opts, fetcher).run(Some(&mut progress))?;
            info!(
                targets = summary.targets,
                fetched = summary.fetched,
                failed = ?summary.failed,
                published = summary.published,
                "run complete"
            );
        }
    }
    Ok(())
}
