// src/specs/feed.rs
//! Scraping *spec* for the public podcast feed.
//!
//! Only episode numbers are taken: each `<item><title>` is expected to read
//! `NNN: Episode Name`. Items whose prefix before the first colon is not a
//! plain number (promos, announcements, titles without a colon) are skipped.

use std::collections::BTreeSet;

use crate::error::FeedError;

pub fn parse_feed_nums(xml: &str) -> Result<BTreeSet<u32>, FeedError> {
    let channel = xml
        .parse::<rss::Channel>()
        .map_err(|e| FeedError::Malformed(e.to_string()))?;

    Ok(channel
        .items()
        .iter()
        .filter_map(|item| item.title())
        .filter_map(episode_num)
        .collect())
}

/// `"812: Tell Me I'm Fat"` → `Some(812)`.
pub fn episode_num(title: &str) -> Option<u32> {
    let (prefix, _) = title.split_once(':')?;
    let prefix = prefix.trim();
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}
