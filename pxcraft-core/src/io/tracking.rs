//! # Tracking
//!
//! Counting units of work and passing them on to a [`ProgressSink`]. One tracker follows
//! one read or one write, it is created by the call and dropped with it.

use std::io::{Read, Result as IOResult};

use super::progress::ProgressSink;

/// Something that can be told that work got done.
pub trait Tracker: Sync {
    fn units_done(&self, units: u64);
}

/// Swallows everything.
#[derive(Default, Debug, Clone, Copy)]
pub struct NullTracker;
impl Tracker for NullTracker {
    fn units_done(&self, _: u64) {}
}

/// The top level tracker of a task with a known total.
pub struct ProgressTracker<'s> {
    sink: &'s dyn ProgressSink,
    total: u64,
    // Reports are made under the lock, so the sink sees them in order.
    done: parking_lot::Mutex<u64>,
}
impl<'s> ProgressTracker<'s> {
    pub fn new(sink: &'s dyn ProgressSink, task: &str, total: u64) -> Self {
        sink.started(task, total);
        Self {
            sink,
            total,
            done: parking_lot::Mutex::new(0),
        }
    }
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }
    #[must_use]
    pub fn done(&self) -> u64 {
        *self.done.lock()
    }
    /// Mark the whole task done, whatever was counted so far.
    pub fn finish(self) {
        let mut done = self.done.lock();
        if *done < self.total {
            *done = self.total;
            self.sink.progressed(self.total, self.total);
        }
    }
}
/// The sink hears `finished` whether the task completed or failed part way.
impl Drop for ProgressTracker<'_> {
    fn drop(&mut self) {
        self.sink.finished();
    }
}
impl Tracker for ProgressTracker<'_> {
    fn units_done(&self, units: u64) {
        let mut done = self.done.lock();
        let new = done.saturating_add(units).min(self.total);
        if new != *done {
            *done = new;
            self.sink.progressed(new, self.total);
        }
    }
}

/// Part of a parent's work, counted in units of its own.
///
/// `child_total` units here make up `share` units of the parent. Fractions are carried until
/// they add up to a whole parent unit, so the parent is never told more than `share`.
pub struct SubtaskTracker<'p> {
    parent: &'p dyn Tracker,
    share: f64,
    child_total: u64,
    /// Child units done, parent units reported.
    state: parking_lot::Mutex<(u64, u64)>,
}
impl<'p> SubtaskTracker<'p> {
    pub fn new(parent: &'p dyn Tracker, share: f64, child_total: u64) -> Self {
        Self {
            parent,
            share: share.max(0.0),
            child_total,
            state: parking_lot::Mutex::new((0, 0)),
        }
    }
    /// Count the rest of the child units as done.
    pub fn finish(&self) {
        self.units_done(self.child_total);
    }
}
impl Tracker for SubtaskTracker<'_> {
    fn units_done(&self, units: u64) {
        let mut state = self.state.lock();
        let (done, reported) = &mut *state;
        *done = done.saturating_add(units).min(self.child_total);
        let fraction = if self.child_total == 0 {
            1.0
        } else {
            *done as f64 / self.child_total as f64
        };
        let target = (self.share * fraction).floor() as u64;
        if target > *reported {
            self.parent.units_done(target - *reported);
            *reported = target;
        }
    }
}

/// Counts bytes read through it.
pub struct ProgressReader<'t, R> {
    inner: R,
    tracker: &'t dyn Tracker,
}
impl<'t, R: Read> ProgressReader<'t, R> {
    pub fn new(inner: R, tracker: &'t dyn Tracker) -> Self {
        Self { inner, tracker }
    }
}
impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> IOResult<usize> {
        let num_read = self.inner.read(buf)?;
        self.tracker.units_done(num_read as u64);
        Ok(num_read)
    }
}
