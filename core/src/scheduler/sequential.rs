//! # Sequential Dispatch
//!
//! Strict FIFO: only the head task advances, and its time references are
//! relative to the previous task's completion rather than to the wall
//! clock. Sequential tasks never repeat; completion, timeout, or removal
//! erases the head and restarts the time base.

use core::sync::atomic::Ordering;

use tempo_hal::clock::{deadline_after, deadline_reached};

use super::Scheduler;
use crate::task::Wait;

/// Outcome of examining the head task.
enum HeadVerdict {
    /// Nothing due yet.
    Wait,
    /// The action is ready to run.
    Execute,
    /// The condition deadline expired.
    TimedOut,
}

impl Scheduler {
    pub(super) fn tick_sequential(&self, now: u32, snapshot: &[crate::Pid]) {
        let pid;
        let verdict;
        let mut action = None;
        {
            let mut inner = self.inner.lock();
            let inner = &mut *inner;
            let baseline = inner.last_sequential_finish;
            let Some(task) = inner.store.front_mut() else {
                return;
            };
            pid = task.pid;

            // Activation: the condition deadline counts from the previous
            // task's completion, not from the current tick.
            if task.execute_at.is_none() {
                if let Wait::Finite(wait_ms) = task.condition_wait {
                    task.execute_at = Some(deadline_after(baseline, wait_ms));
                }
            }

            if !task.condition_met && task.condition_holds() {
                task.condition_met = true;
                task.execute_at = Some(deadline_after(baseline, task.post_delay_ms));
            }

            verdict = if task.condition_met {
                match task.execute_at {
                    Some(at) if deadline_reached(now, at) => HeadVerdict::Execute,
                    _ => HeadVerdict::Wait,
                }
            } else {
                match (task.condition_wait, task.execute_at) {
                    (Wait::Finite(_), Some(at)) if deadline_reached(now, at) => {
                        HeadVerdict::TimedOut
                    }
                    _ => HeadVerdict::Wait,
                }
            };

            if matches!(verdict, HeadVerdict::Execute) {
                action = task.action.take();
            }
        }

        match verdict {
            HeadVerdict::Wait => {}
            HeadVerdict::TimedOut => {
                let handler = {
                    let mut inner = self.inner.lock();
                    inner.last_sequential_finish = now;
                    inner
                        .store
                        .erase(pid)
                        .and_then(|mut task| {
                            self.metrics.record_removal();
                            self.metrics.record_timeout();
                            task.on_timeout.take()
                        })
                };
                if let Some(mut handler) = handler {
                    handler(pid);
                }
            }
            HeadVerdict::Execute => {
                if let Some(mut action) = action {
                    action();
                    self.metrics.record_dispatch();
                }

                let mut inner = self.inner.lock();
                let inner = &mut *inner;
                if self.will_stop.swap(false, Ordering::SeqCst) {
                    // Mass removal from inside the action: every task that
                    // existed when the tick began goes, except the head
                    // (erased below regardless). Tasks the action queued
                    // survive.
                    for victim in inner.ledger.take().into_iter().chain(snapshot.iter().copied()) {
                        if victim != pid && inner.store.erase(victim).is_some() {
                            self.metrics.record_removal();
                        }
                    }
                }
                // Sequential tasks never repeat; completion erases the head.
                if inner.store.erase(pid).is_some() {
                    self.metrics.record_removal();
                }
                inner.last_sequential_finish = now;
            }
        }
    }
}
