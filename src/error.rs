// src/error.rs
//! Error taxonomy.
//!
//! Per-episode problems (`FetchError`, `ParseError`, wrapped as
//! `EpisodeError`) are recovered by the fetch loop and land in the failure
//! table. Everything else converts into [`Error`] and ends the run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal, run-ending errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// Feed request or client setup. Episode fetches never surface here.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("episode page is missing {0}")]
    Missing(&'static str),

    #[error("episode page has an unreadable air date `{0}`")]
    BadDate(String),
}

/// Why one episode could not be turned into a record.
#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed is not valid RSS: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table {0} does not exist (run `init` first)")]
    Missing(PathBuf),

    #[error("table {0} has no header row")]
    NoHeader(PathBuf),

    #[error("table {path} is missing column `{column}`")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("table {path}, line {line}: expected {expected} fields, found {found}")]
    Ragged {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("table {path}, line {line}: `{value}` is not a valid {column}")]
    BadValue {
        path: PathBuf,
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("episode {num}: cannot parse air date `{value}`")]
    BadPubdate { num: u32, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {template}: no value for placeholder `{name}`")]
    MissingField { template: String, name: String },

    #[error("template {template}: unbalanced brace at byte {offset}")]
    Unbalanced { template: String, offset: usize },

    #[error("cannot read template {path}: {message}")]
    Read { path: PathBuf, message: String },
}
