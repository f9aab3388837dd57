// src/config/options.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::consts::*;

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AppOptions {
    pub store: StoreOptions,
    pub fetch: FetchOptions,
    pub output: OutputOptions,
    pub run: RunOptions,
}

/* ---------------- Store ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    pub data_dir: PathBuf,
    pub raw_file: String,
    pub transformed_file: String,
    pub failures_file: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            raw_file: s!(RAW_FILE),
            transformed_file: s!(TRANSFORMED_FILE),
            failures_file: s!(FAILURES_FILE),
        }
    }
}

impl StoreOptions {
    /// Default file names under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: dir.into(), ..Self::default() }
    }

    pub fn raw_path(&self) -> PathBuf { self.data_dir.join(&self.raw_file) }
    pub fn transformed_path(&self) -> PathBuf { self.data_dir.join(&self.transformed_file) }
    pub fn failures_path(&self) -> PathBuf { self.data_dir.join(&self.failures_file) }
}

/* ---------------- Fetch ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub feed_url: String,
    /// Must contain `{num}`.
    pub episode_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Minimum gap between two outbound requests.
    pub request_pause: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            feed_url: s!(FEED_URL),
            episode_url: s!(EPISODE_URL),
            user_agent: s!(USER_AGENT),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            request_pause: Duration::from_millis(REQUEST_PAUSE_MS),
        }
    }
}

impl FetchOptions {
    pub fn episode_url_for(&self, num: u32) -> String {
        self.episode_url.replace("{num}", &num.to_string())
    }
}

/* ---------------- Output ---------------- */

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputOptions {
    pub template_dir: PathBuf,
    pub item_template: String,
    pub feed_template: String,
    pub out_path: PathBuf,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            item_template: s!(ITEM_TEMPLATE),
            feed_template: s!(FEED_TEMPLATE),
            out_path: PathBuf::from(DEFAULT_OUT_FILE),
        }
    }
}

impl OutputOptions {
    pub fn item_template_path(&self) -> PathBuf { self.template_dir.join(&self.item_template) }
    pub fn feed_template_path(&self) -> PathBuf { self.template_dir.join(&self.feed_template) }
    pub fn out_path(&self) -> &Path { &self.out_path }
}

/* ---------------- Run ---------------- */

/// Which episode numbers a run goes after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorkMode {
    /// Advertised in the feed but not yet published.
    #[default]
    Feed,
    /// Everything already published, to pick up corrections.
    Refresh,
    /// Every gap in `1..=max`, plus published episodes still on a temporary download host.
    Backfill,
}

/// What to do with a failed episode whose error message is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    RecordAll,
    SkipEmptyMessages,
}

impl FailurePolicy {
    pub fn records(self, message: &str) -> bool {
        match self {
            FailurePolicy::RecordAll => true,
            FailurePolicy::SkipEmptyMessages => !message.is_empty(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: WorkMode,
    pub failure_policy: FailurePolicy,
    pub canonical_host: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: WorkMode::default(),
            failure_policy: FailurePolicy::default(),
            canonical_host: s!(CANONICAL_HOST),
        }
    }
}
