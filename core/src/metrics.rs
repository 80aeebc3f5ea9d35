//! # Scheduler Metrics
//!
//! Event counters for scheduler introspection.

use core::sync::atomic::{AtomicU32, Ordering};

/// Scheduler event counters.
pub struct SchedulerMetrics {
    /// Engine steps taken
    ticks: AtomicU32,
    /// Actions dispatched
    dispatches: AtomicU32,
    /// Tasks removed because their condition deadline expired
    timeouts: AtomicU32,
    /// Tasks removed for any reason
    removals: AtomicU32,
    /// Adds rejected because the store was full
    capacity_rejections: AtomicU32,
}

impl SchedulerMetrics {
    /// Create new metrics.
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            dispatches: AtomicU32::new(0),
            timeouts: AtomicU32::new(0),
            removals: AtomicU32::new(0),
            capacity_rejections: AtomicU32::new(0),
        }
    }

    /// Record an engine step.
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dispatched action.
    pub fn record_dispatch(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a condition-deadline expiry.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a task removal.
    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an add rejected at capacity.
    pub fn record_capacity_rejection(&self) {
        self.capacity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot.
    pub fn snapshot(&self, live_tasks: usize) -> SchedulerStats {
        SchedulerStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            capacity_rejections: self.capacity_rejections.load(Ordering::Relaxed),
            live_tasks,
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
        self.dispatches.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.removals.store(0, Ordering::Relaxed);
        self.capacity_rejections.store(0, Ordering::Relaxed);
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time scheduler statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Engine steps taken.
    pub ticks: u32,
    /// Actions dispatched.
    pub dispatches: u32,
    /// Tasks removed because their condition deadline expired.
    pub timeouts: u32,
    /// Tasks removed for any reason.
    pub removals: u32,
    /// Adds rejected because the store was full.
    pub capacity_rejections: u32,
    /// Tasks currently stored.
    pub live_tasks: usize,
}
