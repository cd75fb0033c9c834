//! Where progress of a long read or write ends up.

use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress of one read or write at a time.
pub trait ProgressSink: Sync {
    fn started(&self, task: &str, total: u64);
    /// `done` out of `total` units complete. Never decreases between `started` and `finished`.
    fn progressed(&self, done: u64, total: u64);
    fn finished(&self);
}

/// Discards all progress.
#[derive(Default, Debug, Clone, Copy)]
pub struct NullProgress;
impl ProgressSink for NullProgress {
    fn started(&self, _: &str, _: u64) {}
    fn progressed(&self, _: u64, _: u64) {}
    fn finished(&self) {}
}

/// Logs each tenth of the way.
#[derive(Default, Debug)]
pub struct LogProgress {
    tenths: AtomicU64,
}
impl ProgressSink for LogProgress {
    fn started(&self, task: &str, total: u64) {
        self.tenths.store(0, Ordering::Relaxed);
        log::info!("{task} ({total} units)");
    }
    fn progressed(&self, done: u64, total: u64) {
        let tenths = done.saturating_mul(10).checked_div(total).unwrap_or(10);
        if self.tenths.fetch_max(tenths, Ordering::Relaxed) < tenths {
            log::info!("{}%", tenths * 10);
        }
    }
    fn finished(&self) {
        log::debug!("done");
    }
}
