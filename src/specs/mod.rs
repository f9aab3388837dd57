// src/specs/mod.rs
//! # Scraping "specs" module
//!
//! Page-specific knowledge of the remote site: *where the ground truth lives*
//! in each document and how to extract it.
//!
//! - `episode` – one episode page → [`episode::EpisodeFields`], via the
//!   [`crate::core::html::EpisodeTree`] queries.
//! - `feed` – the public RSS feed → set of advertised episode numbers.
//!
//! Specs do no networking, caching or normalization. The fetch loop in
//! `scrape` hands them response text; `transform` cleans the fields later.
//! All of them are testable offline against inline fixtures.
pub mod episode;
pub mod feed;
