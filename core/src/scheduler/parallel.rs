//! # Parallel Dispatch
//!
//! All stored tasks progress concurrently against wall-clock time. Each
//! tick runs five passes: activation, classification, dispatch,
//! reconciliation, and removal commit. The lock is held across the
//! bookkeeping passes and released around every user callback.

use alloc::vec::Vec;
use core::sync::atomic::Ordering;

use tempo_hal::clock::{deadline_after, deadline_reached};

use super::Scheduler;
use crate::task::Wait;

impl Scheduler {
    pub(super) fn tick_parallel(&self, now: u32, snapshot: &[crate::Pid]) {
        let mut exec = Vec::new();
        let mut timed_out = Vec::new();

        {
            let mut inner = self.inner.lock();

            // Activation: give unactivated tasks a concrete deadline. An
            // indefinite task activates only once its predicate holds; a
            // finite wait turns into a condition deadline immediately.
            for task in inner.store.iter_mut() {
                if task.execute_at.is_some() {
                    continue;
                }
                match task.condition_wait {
                    Wait::Indefinite => {
                        if task.condition_holds() {
                            task.condition_met = true;
                            task.execute_at = Some(deadline_after(now, task.post_delay_ms));
                        }
                        // Predicate still false: retry on a later tick.
                    }
                    Wait::Finite(wait_ms) => {
                        task.execute_at = Some(deadline_after(now, wait_ms));
                    }
                }
            }

            // Classification: split ready tasks from expired ones, in
            // insertion order.
            for task in inner.store.iter_mut() {
                if !task.condition_met {
                    if task.condition_holds() {
                        task.condition_met = true;
                        task.execute_at = Some(deadline_after(now, task.post_delay_ms));
                    } else if let (Wait::Finite(_), Some(at)) =
                        (task.condition_wait, task.execute_at)
                    {
                        if deadline_reached(now, at) {
                            timed_out.push(task.pid);
                        }
                    }
                } else if let Some(at) = task.execute_at {
                    if deadline_reached(now, at) {
                        exec.push(task.pid);
                    }
                }
            }
        }

        // Dispatch: run each ready action with the lock released. The body
        // is taken out of its task and restored afterwards, so an action
        // that queues new tasks never observes a store borrow.
        let mut dispatched = Vec::new();
        let mut stopped = false;
        for &pid in exec.iter() {
            let action = self
                .inner
                .lock()
                .store
                .get_mut(pid)
                .and_then(|task| task.action.take());
            let Some(mut action) = action else { continue };
            action();
            self.metrics.record_dispatch();
            dispatched.push(pid);

            let mut inner = self.inner.lock();
            let inner = &mut *inner;
            if let Some(task) = inner.store.get_mut(pid) {
                task.action = Some(action);
            }
            if self.will_stop.swap(false, Ordering::SeqCst) {
                // Mass removal requested mid-tick: the not-yet-run
                // remainder of `exec` is discarded, and every task that
                // existed when the tick began is folded into the uniform
                // removal below. Tasks queued during this tick survive.
                for victim in inner.ledger.take().into_iter().chain(snapshot.iter().copied()) {
                    if let Some(task) = inner.store.get_mut(victim) {
                        task.repeat = false;
                        dispatched.push(victim);
                    }
                }
                stopped = true;
            }
            drop(inner);
            if stopped {
                break;
            }
        }

        // Reconcile and commit. Repeating tasks return to a fresh pending
        // phase; everything else dispatched or expired is erased.
        let mut inner = self.inner.lock();
        let mut remove = timed_out.clone();
        for &pid in dispatched.iter() {
            match inner.store.get_mut(pid) {
                Some(task) if task.repeat => task.reset_for_repeat(),
                Some(_) => remove.push(pid),
                None => {}
            }
        }
        remove.sort_unstable();
        remove.dedup();

        let mut expired = Vec::new();
        for pid in remove {
            if let Some(mut task) = inner.store.erase(pid) {
                self.metrics.record_removal();
                if timed_out.contains(&pid) {
                    self.metrics.record_timeout();
                    if let Some(handler) = task.on_timeout.take() {
                        expired.push((pid, handler));
                    }
                }
            }
        }
        drop(inner);

        // Timeout notifications run after dispatch, outside the lock.
        for (pid, mut handler) in expired {
            handler(pid);
        }
    }
}
