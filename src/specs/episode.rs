// src/specs/episode.rs
//! Scraping *spec* for one episode page (`/episode/{num}`).
//!
//! Layout relied on:
//! - `div.episode-title > h1` holds the title.
//! - The title block sits inside a `div.container`; everything else is
//!   looked up inside that container:
//!   - air date: `div.meta div.field-name-field-radio-air-date span.date-display-single`
//!   - description: `div.field-name-body` (optional)
//!   - download: `ul.actions li.download a[href]`
//!
//! Title, date and download link are mandatory. A missing description is an
//! empty string.

use crate::core::html::{EpisodeTree, ScrapedPage};
use crate::error::ParseError;

/// Fields read off the page, untrimmed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpisodeFields {
    pub pubdate: String,
    pub title: String,
    pub description: String,
    pub download_url: String,
}

pub fn parse_episode(html: &str) -> Result<EpisodeFields, ParseError> {
    extract(&ScrapedPage::parse(html))
}

/// Split out so any `EpisodeTree` can be driven.
pub fn extract<T: EpisodeTree>(tree: &T) -> Result<EpisodeFields, ParseError> {
    let title_block = tree.find_title_block().ok_or(ParseError::Missing("title block"))?;
    let heading = tree
        .find_title_heading(title_block)
        .ok_or(ParseError::Missing("title heading"))?;
    let container = tree
        .find_ancestor_container(title_block)
        .ok_or(ParseError::Missing("content container"))?;

    let description = tree
        .find_description(container)
        .map(|n| tree.text(n))
        .unwrap_or_default();

    let pubdate = tree
        .find_air_date(container)
        .map(|n| tree.text(n))
        .ok_or(ParseError::Missing("air date"))?;

    let download_url = tree
        .find_download_link(container)
        .and_then(|n| tree.attr(n, "href"))
        .ok_or(ParseError::Missing("download link"))?;

    Ok(EpisodeFields {
        pubdate,
        title: tree.text(heading),
        description,
        download_url,
    })
}
