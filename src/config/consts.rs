// src/config/consts.rs

// Net config
pub const FEED_URL: &str = "http://feed.thisamericanlife.org/talpodcast";
pub const EPISODE_URL: &str = "https://www.thisamericanlife.org/episode/{num}";
pub const USER_AGENT: &str = concat!("tal_archive/", env!("CARGO_PKG_VERSION"));
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const REQUEST_PAUSE_MS: u64 = 1_000; // be polite

// Local tables
pub const DEFAULT_DATA_DIR: &str = "data";
pub const RAW_FILE: &str = "raw.csv";
pub const TRANSFORMED_FILE: &str = "transformed.csv";
pub const FAILURES_FILE: &str = "missing.csv";

// Output
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";
pub const ITEM_TEMPLATE: &str = "item.xml";
pub const FEED_TEMPLATE: &str = "feed.xml";
pub const DEFAULT_OUT_FILE: &str = "TALArchive.xml";

// Download links not on this host are temporary and get re-checked in backfill mode
pub const CANONICAL_HOST: &str = "thisamericanlife.org";
