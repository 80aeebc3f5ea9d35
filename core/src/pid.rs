//! # PID Allocation
//!
//! Monotonically increasing nonzero u16 identifiers, skipping zero on wrap
//! and skipping values still attached to live tasks.

use core::num::NonZeroU16;

use crate::store::TaskStore;
use crate::Pid;

/// Next nonzero value after `raw`, wrapping 0xFFFF -> 1.
fn bump(raw: u16) -> NonZeroU16 {
    NonZeroU16::new(raw.wrapping_add(1)).unwrap_or(NonZeroU16::MIN)
}

/// Hands out fresh task identifiers.
pub(crate) struct PidAllocator {
    next: NonZeroU16,
}

impl PidAllocator {
    pub(crate) const fn new() -> Self {
        Self {
            next: NonZeroU16::MIN,
        }
    }

    /// The next free PID.
    ///
    /// Starts from the running counter and increments (with zero-skip) past
    /// any value attached to a live task. Terminates because the store
    /// holds at most `MAX_TASKS` tasks, far fewer than the 65535 candidate
    /// values. The counter advances one past the returned value.
    pub(crate) fn allocate(&mut self, store: &TaskStore) -> Pid {
        let mut candidate = self.next;
        while store.contains(Pid::from_nonzero(candidate)) {
            candidate = bump(candidate.get());
        }
        self.next = bump(candidate.get());
        Pid::from_nonzero(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, Wait};
    use alloc::boxed::Box;

    fn task(pid: Pid) -> Task {
        Task {
            pid,
            action: Some(Box::new(|| {})),
            predicate: None,
            on_timeout: None,
            repeat: false,
            interval_ms: 0,
            condition_wait: Wait::Indefinite,
            post_delay_ms: 0,
            condition_met: false,
            execute_at: None,
        }
    }

    #[test]
    fn allocates_sequentially_from_one() {
        let store = TaskStore::new();
        let mut pids = PidAllocator::new();
        assert_eq!(pids.allocate(&store).as_u16(), 1);
        assert_eq!(pids.allocate(&store).as_u16(), 2);
        assert_eq!(pids.allocate(&store).as_u16(), 3);
    }

    #[test]
    fn skips_live_pids() {
        let mut store = TaskStore::new();
        let mut pids = PidAllocator::new();
        let first = pids.allocate(&store);
        store.push(task(first)).unwrap();
        let second = pids.allocate(&store);
        store.push(task(second)).unwrap();
        // Rewind the counter onto the live range; both live values must be
        // stepped over.
        let mut rewound = PidAllocator::new();
        let third = rewound.allocate(&store);
        assert_eq!(third.as_u16(), 3);
    }

    #[test]
    fn wraps_past_zero() {
        let store = TaskStore::new();
        let mut pids = PidAllocator {
            next: NonZeroU16::new(u16::MAX).unwrap(),
        };
        assert_eq!(pids.allocate(&store).as_u16(), u16::MAX);
        assert_eq!(pids.allocate(&store).as_u16(), 1);
    }
}
