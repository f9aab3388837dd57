// src/transform.rs
//! raw table → transformed table.
//!
//! Total and deterministic: the same raw rows always give byte-identical
//! output. Steps, in order:
//! 1. dedup by `num`, first occurrence wins
//! 2. normalize every text field (`core::sanitize::normalize_text`)
//! 3. strip the query string from `download_url`
//! 4. pin the air date to 18:00 at UTC-4 and reformat as RFC 2822
//! 5. stable sort, most recent first

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};

use crate::core::sanitize::{normalize_text, strip_query};
use crate::error::TransformError;
use crate::store::EpisodeRecord;

/// Appended to every scraped air date before parsing. Approximates the
/// original broadcast time; the pages only carry a date.
pub const AIR_TIME_SUFFIX: &str = " 18:00:00 -0400";

pub const PUBDATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Date shapes seen on episode pages, after `canonical_date`, each followed
/// by the suffix above.
const DATE_FORMATS: &[&str] = &[
    "%B %d %Y %H:%M:%S %z", // June 26 2015 (also accepts Jun)
    "%Y-%m-%d %H:%M:%S %z",
    "%m/%d/%Y %H:%M:%S %z",
    "%d %B %Y %H:%M:%S %z",
];

/// Drop periods and commas, collapse whitespace, and spell `Sept` as `Sep`.
/// `"Sept. 5,  2015"` → `"Sep 5 2015"`.
fn canonical_date(date: &str) -> String {
    let cleaned: String = date
        .chars()
        .filter(|&c| c != '.')
        .map(|c| if c == ',' { ' ' } else { c })
        .collect();
    cleaned
        .split_whitespace()
        .map(|tok| if tok.eq_ignore_ascii_case("sept") { "Sep" } else { tok })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_air_date(date: &str) -> Option<DateTime<FixedOffset>> {
    let stamped = format!("{}{AIR_TIME_SUFFIX}", canonical_date(date));
    DATE_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&stamped, fmt).ok())
}

pub fn transform(raw: &[EpisodeRecord]) -> Result<Vec<EpisodeRecord>, TransformError> {
    let mut seen = HashSet::new();
    let mut dated: Vec<(DateTime<FixedOffset>, EpisodeRecord)> = Vec::with_capacity(raw.len());

    for rec in raw.iter().filter(|r| seen.insert(r.num)) {
        let pubdate = normalize_text(&rec.pubdate);
        let when = parse_air_date(&pubdate).ok_or_else(|| TransformError::BadPubdate {
            num: rec.num,
            value: pubdate.clone(),
        })?;

        let out = EpisodeRecord {
            num: rec.num,
            title: normalize_text(&rec.title),
            download_url: s!(strip_query(&normalize_text(&rec.download_url))),
            description: normalize_text(&rec.description),
            pubdate: when.format(PUBDATE_FORMAT).to_string(),
            url: normalize_text(&rec.url),
            full_url: normalize_text(&rec.full_url),
        };
        dated.push((when, out));
    }

    dated.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(dated.into_iter().map(|(_, r)| r).collect())
}
