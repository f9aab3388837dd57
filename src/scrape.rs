// src/scrape.rs
//! Work-set computation and the fetch loop.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::{
    config::options::{FailurePolicy, WorkMode},
    core::{net::Fetch, sanitize::normalize_text},
    error::{EpisodeError, ParseError, Result},
    progress::Progress,
    specs::{episode, feed},
    store::{EpisodeRecord, FetchFailure},
    transform::parse_air_date,
};

/// Outcome of one pass over the work set.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: Vec<EpisodeRecord>,
    pub failures: Vec<FetchFailure>,
}

pub fn published_nums(transformed: &[EpisodeRecord]) -> BTreeSet<u32> {
    transformed.iter().map(|r| r.num).collect()
}

/// Advertised in the feed, not yet published.
pub fn feed_targets(feed: &BTreeSet<u32>, published: &BTreeSet<u32>) -> BTreeSet<u32> {
    feed.difference(published).copied().collect()
}

/// Every unpublished number up to the highest one known, plus published
/// episodes whose download link is off the canonical host and which have
/// dropped out of the feed.
pub fn backfill_targets(
    transformed: &[EpisodeRecord],
    feed: &BTreeSet<u32>,
    canonical_host: &str,
) -> BTreeSet<u32> {
    let published = published_nums(transformed);
    let max = published.iter().chain(feed).copied().max().unwrap_or(0);

    let mut targets: BTreeSet<u32> = (1..=max).filter(|n| !published.contains(n)).collect();
    targets.extend(
        transformed
            .iter()
            .filter(|r| !r.download_url.contains(canonical_host))
            .map(|r| r.num)
            .filter(|n| !feed.contains(n)),
    );
    targets
}

/// Decide which episode numbers this run fetches. Hits the feed unless in
/// refresh mode.
pub fn resolve_targets<F: Fetch>(
    fetcher: &mut F,
    mode: WorkMode,
    transformed: &[EpisodeRecord],
    canonical_host: &str,
) -> Result<BTreeSet<u32>> {
    let published = published_nums(transformed);

    let targets = match mode {
        WorkMode::Refresh => published,
        WorkMode::Feed | WorkMode::Backfill => {
            let xml = fetcher.fetch_feed()?;
            let advertised = feed::parse_feed_nums(&xml)?;
            debug!(advertised = advertised.len(), "feed parsed");

            if mode == WorkMode::Feed {
                feed_targets(&advertised, &published)
            } else {
                backfill_targets(transformed, &advertised, canonical_host)
            }
        }
    };

    info!(?mode, targets = targets.len(), "work set resolved");
    Ok(targets)
}

/// Fetch + parse one episode into a raw record. The air date must already
/// be readable here; a row in raw always survives `transform`.
pub fn fetch_episode<F: Fetch>(fetcher: &mut F, num: u32) -> std::result::Result<EpisodeRecord, EpisodeError> {
    let page = fetcher.fetch_page(num)?;
    let fields = episode::parse_episode(&page.text)?;
    if parse_air_date(&normalize_text(&fields.pubdate)).is_none() {
        return Err(ParseError::BadDate(fields.pubdate.trim().to_string()).into());
    }

    Ok(EpisodeRecord {
        num,
        title: fields.title,
        download_url: fields.download_url,
        description: fields.description,
        pubdate: fields.pubdate,
        url: page.url,
        full_url: page.final_url,
    })
}

/// Sequential fetch loop. Per-episode failures are collected, never fatal.
pub fn collect_episodes<F: Fetch>(
    fetcher: &mut F,
    nums: &BTreeSet<u32>,
    policy: FailurePolicy,
    mut progress: Option<&mut dyn Progress>,
) -> Batch {
    let mut batch = Batch::default();

    if let Some(p) = progress.as_deref_mut() {
        p.begin(nums.len());
    }

    for &num in nums {
        match fetch_episode(fetcher, num) {
            Ok(rec) => {
                batch.records.push(rec);
                if let Some(p) = progress.as_deref_mut() {
                    p.item_done(num);
                }
            }
            Err(e) => {
                let reason = e.to_string();
                if let Some(p) = progress.as_deref_mut() {
                    p.item_failed(num, &reason);
                }
                if policy.records(&reason) {
                    batch.failures.push(FetchFailure { num, reason });
                } else {
                    debug!(num, "dropping failure with empty message");
                }
            }
        }
    }

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    batch
}
