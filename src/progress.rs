// src/progress.rs
use tracing::{info, warn};

/// Progress reporting for the fetch loop.
/// Frontends implement this to surface status to users.
pub trait Progress {
    /// Called at the start with the number of episodes to fetch.
    fn begin(&mut self, _total: usize) {}

    /// One episode fetched and parsed.
    fn item_done(&mut self, _num: u32) {}

    /// One episode failed; the run carries on.
    fn item_failed(&mut self, _num: u32, _reason: &str) {}

    /// Called at the end of the loop.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Reports through `tracing`; what the CLI uses.
#[derive(Default)]
pub struct LogProgress {
    total: usize,
    done: usize,
    failed: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        info!(total, "fetching episodes");
    }

    fn item_done(&mut self, num: u32) {
        self.done += 1;
        info!(num, "[{}/{}] fetched", self.done + self.failed, self.total);
    }

    fn item_failed(&mut self, num: u32, reason: &str) {
        self.failed += 1;
        warn!(num, reason, "[{}/{}] failed", self.done + self.failed, self.total);
    }

    fn finish(&mut self) {
        info!(fetched = self.done, failed = self.failed, "fetch loop finished");
    }
}
