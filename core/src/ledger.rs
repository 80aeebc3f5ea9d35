//! # Removal Ledger
//!
//! Deferred-deletion queue. PIDs marked here are dropped from the store at
//! the next safe point; duplicates are tolerated and missing PIDs are
//! skipped.

use alloc::vec::Vec;

use crate::store::TaskStore;
use crate::Pid;

/// PIDs pending deletion.
pub(crate) struct RemovalLedger {
    pids: Vec<Pid>,
}

impl RemovalLedger {
    pub(crate) const fn new() -> Self {
        Self { pids: Vec::new() }
    }

    /// Queue a PID for deletion.
    pub(crate) fn mark(&mut self, pid: Pid) {
        self.pids.push(pid);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// Erase every marked PID from the store and clear the ledger.
    pub(crate) fn apply(&mut self, store: &mut TaskStore) {
        for pid in self.pids.drain(..) {
            store.erase(pid);
        }
    }

    /// Hand over the marked PIDs, leaving the ledger empty.
    pub(crate) fn take(&mut self) -> Vec<Pid> {
        core::mem::take(&mut self.pids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, Wait};
    use alloc::boxed::Box;
    use core::num::NonZeroU16;

    fn pid(raw: u16) -> Pid {
        Pid::from_nonzero(NonZeroU16::new(raw).unwrap())
    }

    fn task(raw: u16) -> Task {
        Task {
            pid: pid(raw),
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
    fn apply_tolerates_duplicates_and_missing() {
        let mut store = TaskStore::new();
        store.push(task(1)).unwrap();
        store.push(task(2)).unwrap();

        let mut ledger = RemovalLedger::new();
        ledger.mark(pid(1));
        ledger.mark(pid(1));
        ledger.mark(pid(40));
        ledger.apply(&mut store);

        assert!(ledger.is_empty());
        assert_eq!(store.len(), 1);
        assert!(store.contains(pid(2)));
    }
}
