// src/runner.rs
//! One full run: work set → fetch loop → persist → transform → render.

use std::fs;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    config::options::{AppOptions, OutputOptions, RunOptions},
    core::net::Fetch,
    error::{Error, Result},
    progress::Progress,
    render::Templates,
    scrape,
    store::Store,
    transform::transform,
};

/// Summary of what a run produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub fetched: usize,
    pub failed: Vec<u32>,
    pub published: usize,
}

pub struct Orchestrator<F: Fetch> {
    store: Store,
    fetcher: F,
    run: RunOptions,
    output: OutputOptions,
}

impl<F: Fetch> Orchestrator<F> {
    pub fn new(opts: &AppOptions, fetcher: F) -> Self {
        Self {
            store: Store::new(opts.store.clone()),
            fetcher,
            run: opts.run.clone(),
            output: opts.output.clone(),
        }
    }

    pub fn store(&self) -> &Store { &self.store }

    pub fn run(&mut self, progress: Option<&mut dyn Progress>) -> Result<RunSummary> {
        self.run_at(Utc::now(), progress)
    }

    /// `run` with an explicit refresh timestamp.
    ///
    /// An empty work set skips the fetch loop and the raw merge, but the
    /// failure table is still rewritten (empty): it only ever describes the
    /// latest run, so failures from an earlier run are not carried forward.
    pub fn run_at(
        &mut self,
        now: DateTime<Utc>,
        progress: Option<&mut dyn Progress>,
    ) -> Result<RunSummary> {
        // Templates first so a broken template fails before any network traffic.
        let templates = Templates::load(&self.output)?;

        let transformed = self.store.read_transformed()?;
        let targets = scrape::resolve_targets(
            &mut self.fetcher,
            self.run.mode,
            &transformed,
            &self.run.canonical_host,
        )?;

        let mut summary = RunSummary { targets: targets.len(), ..Default::default() };

        if targets.is_empty() {
            info!("nothing to fetch");
            self.store.write_failures(Vec::new())?;
        } else {
            let batch = scrape::collect_episodes(&mut self.fetcher, &targets, self.run.failure_policy, progress);
            summary.fetched = batch.records.len();
            summary.failed = batch.failures.iter().map(|f| f.num).collect();

            let raw_rows = self.store.write_batch(batch.records, batch.failures)?;
            info!(raw_rows, "raw table merged");
        }

        summary.published = publish(&self.store, &self.output, &templates, now)?;
        Ok(summary)
    }
}

/// Transform + render from what is on disk. No network.
pub fn render_only(opts: &AppOptions, now: DateTime<Utc>) -> Result<usize> {
    let templates = Templates::load(&opts.output)?;
    publish(&Store::new(opts.store.clone()), &opts.output, &templates, now)
}

/// raw → transformed table → feed document.
pub fn publish(
    store: &Store,
    output: &OutputOptions,
    templates: &Templates,
    now: DateTime<Utc>,
) -> Result<usize> {
    let raw = store.read_raw()?;
    let rows = transform(&raw)?;
    store.write_transformed(&rows)?;

    let failures = store.read_failures()?;
    let doc = templates.render(&rows, &failures, now)?;

    let out = output.out_path();
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;
        }
    }
    fs::write(out, doc).map_err(|source| Error::Io { path: out.to_path_buf(), source })?;

    info!(episodes = rows.len(), out = %out.display(), "feed written");
    Ok(rows.len())
}
