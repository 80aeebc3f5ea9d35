//! # Scheduler Engine
//!
//! The cooperative scheduling state machine and its public control surface.
//!
//! The outer driver calls [`Scheduler::tick`] periodically. Each tick runs
//! to completion without blocking: it activates pending tasks, dispatches
//! the ready ones, and commits lifecycle changes, including changes
//! requested from inside the running actions themselves (queued additions,
//! a mid-tick [`stop`](Scheduler::stop)).
//!
//! The store, the removal ledger, and the control flags are protected by a
//! critical section so that interrupt-service code may call the control
//! API. Critical sections stay short; actions and timeout handlers are
//! always invoked with the lock released.

mod parallel;
mod sequential;

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;
use tempo_hal::clock::{millis_until, Clock};

use crate::config::{MAX_TASKS, MAX_WAIT_MS};
use crate::ledger::RemovalLedger;
use crate::metrics::{SchedulerMetrics, SchedulerStats};
use crate::pid::PidAllocator;
use crate::store::TaskStore;
use crate::task::{Task, TaskAction, TaskPredicate, TimeoutHandler, Wait};
use crate::{Pid, SchedError, SchedResult};

/// Mutable scheduler state, guarded by one critical section.
struct Inner {
    store: TaskStore,
    ledger: RemovalLedger,
    pids: PidAllocator,
    /// Completion tick of the most recent sequential task; the time base
    /// for the head task's delays in sequential mode.
    last_sequential_finish: u32,
}

/// Cooperative task scheduler.
///
/// All methods take `&self`; the state lives behind a critical section and
/// atomic flags, so an instance can be shared with interrupt-service code
/// or placed in a `static`.
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
    /// Sequential (FIFO head-only) discipline flag.
    sequential: AtomicBool,
    /// While held, `tick` returns immediately.
    on_hold: AtomicBool,
    /// Mass-removal request, honored at the next safe point.
    will_stop: AtomicBool,
    /// Set while the engine body runs; driver-side mutators refuse
    /// re-entry.
    in_loop: AtomicBool,
    metrics: SchedulerMetrics,
}

/// Scope guard marking "inside the engine body"; cleared on every exit
/// path, including unwinding ones.
struct LoopGuard<'a>(&'a AtomicBool);

impl<'a> LoopGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoopGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Scheduler {
    /// Create a scheduler reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let origin = clock.now_ms();
        Self {
            clock,
            inner: Mutex::new(Inner {
                store: TaskStore::new(),
                ledger: RemovalLedger::new(),
                pids: PidAllocator::new(),
                last_sequential_finish: origin,
            }),
            sequential: AtomicBool::new(false),
            on_hold: AtomicBool::new(false),
            will_stop: AtomicBool::new(false),
            in_loop: AtomicBool::new(false),
            metrics: SchedulerMetrics::new(),
        }
    }

    // -------------------------------------------------------------------
    // Add family
    // -------------------------------------------------------------------

    /// Queue `action` to run `delay_ms` after the task is first examined.
    ///
    /// With `repeat`, the task re-arms after each dispatch and runs every
    /// `interval_ms` thereafter. Repetition is a parallel-mode feature; in
    /// sequential mode the request is demoted to a one-shot with a warning.
    pub fn add_timed_task(
        &self,
        action: impl FnMut() + Send + 'static,
        delay_ms: u32,
        repeat: bool,
        interval_ms: u32,
    ) -> SchedResult<Pid> {
        let mut repeat = repeat;
        if repeat && self.is_sequential_mode() {
            log::warn!("repeating tasks are unavailable in sequential mode; queueing once");
            repeat = false;
        }
        self.insert_task(
            Box::new(action),
            None,
            None,
            repeat,
            interval_ms,
            Wait::Indefinite,
            delay_ms,
        )
    }

    /// Queue `action` to run as soon as `predicate` holds.
    ///
    /// A nonzero `wait_ms` bounds how long the predicate may stay false
    /// after activation; past the deadline the task is removed and
    /// `on_timeout`, if provided, receives its PID. `wait_ms == 0` waits
    /// indefinitely.
    pub fn add_conditional_task(
        &self,
        action: impl FnMut() + Send + 'static,
        predicate: impl FnMut() -> bool + Send + 'static,
        wait_ms: u32,
        on_timeout: Option<TimeoutHandler>,
    ) -> SchedResult<Pid> {
        self.insert_task(
            Box::new(action),
            Some(Box::new(predicate)),
            on_timeout,
            false,
            0,
            Wait::from_millis(wait_ms),
            0,
        )
    }

    /// Queue `action` to run `post_delay_ms` after `predicate` first holds,
    /// with the same deadline semantics as
    /// [`add_conditional_task`](Scheduler::add_conditional_task).
    pub fn add_conditional_timed_task(
        &self,
        action: impl FnMut() + Send + 'static,
        predicate: impl FnMut() -> bool + Send + 'static,
        post_delay_ms: u32,
        wait_ms: u32,
        on_timeout: Option<TimeoutHandler>,
    ) -> SchedResult<Pid> {
        self.insert_task(
            Box::new(action),
            Some(Box::new(predicate)),
            on_timeout,
            false,
            0,
            Wait::from_millis(wait_ms),
            post_delay_ms,
        )
    }

    fn insert_task(
        &self,
        action: TaskAction,
        predicate: Option<TaskPredicate>,
        on_timeout: Option<TimeoutHandler>,
        repeat: bool,
        interval_ms: u32,
        condition_wait: Wait,
        post_delay_ms: u32,
    ) -> SchedResult<Pid> {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        if inner.store.len() >= MAX_TASKS {
            self.metrics.record_capacity_rejection();
            log::warn!("task store is full ({} tasks); add rejected", MAX_TASKS);
            return Err(SchedError::CapacityExceeded);
        }
        let pid = inner.pids.allocate(&inner.store);
        inner.store.push(Task {
            pid,
            action: Some(action),
            predicate,
            on_timeout,
            repeat,
            interval_ms,
            condition_wait,
            post_delay_ms,
            condition_met: false,
            execute_at: None,
        })?;
        log::debug!("queued task {}", pid.as_u16());
        Ok(pid)
    }

    // -------------------------------------------------------------------
    // Driver-side mutators
    // -------------------------------------------------------------------

    /// Schedule `pid` for removal at the next safe point.
    ///
    /// Returns whether the task exists at call time. Illegal from inside an
    /// action: re-entrant calls are logged and ignored.
    pub fn remove_task(&self, pid: Pid) -> bool {
        if self.in_loop.load(Ordering::SeqCst) {
            log::error!(
                "remove_task({}) called from inside the engine; ignored",
                pid.as_u16()
            );
            return false;
        }
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let exists = inner.store.contains(pid);
        if exists {
            inner.ledger.mark(pid);
        }
        exists
    }

    /// Change the firing interval of a repeating task.
    ///
    /// The task returns to a fresh pending phase, so the next dispatch
    /// happens `interval_ms` after the change is observed. Illegal from
    /// inside an action.
    pub fn set_repeating_interval(&self, pid: Pid, interval_ms: u32) -> SchedResult<()> {
        if self.in_loop.load(Ordering::SeqCst) {
            log::error!(
                "set_repeating_interval({}) called from inside the engine; refused",
                pid.as_u16()
            );
            return Err(SchedError::InLoop);
        }
        let mut inner = self.inner.lock();
        let task = inner.store.get_mut(pid).ok_or(SchedError::NotFound)?;
        if !task.repeat {
            return Err(SchedError::NotRepeating);
        }
        task.interval_ms = interval_ms;
        task.post_delay_ms = interval_ms;
        task.execute_at = None;
        Ok(())
    }

    /// Switch between the parallel and sequential disciplines.
    ///
    /// Entering sequential mode restarts the completion time base at the
    /// current tick and demotes any stored repeating task to a one-shot.
    pub fn set_sequential_mode(&self, sequential: bool) {
        let was = self.sequential.swap(sequential, Ordering::SeqCst);
        if sequential && !was {
            let mut inner = self.inner.lock();
            inner.last_sequential_finish = self.clock.now_ms();
            for task in inner.store.iter_mut() {
                if task.repeat {
                    log::warn!(
                        "task {} loses its repeat flag in sequential mode",
                        task.pid.as_u16()
                    );
                    task.repeat = false;
                }
            }
        }
    }

    /// Whether the sequential discipline is active.
    pub fn is_sequential_mode(&self) -> bool {
        self.sequential.load(Ordering::SeqCst)
    }

    /// Pause the engine; `tick` returns immediately until
    /// [`resume`](Scheduler::resume). Idempotent.
    pub fn hold(&self) {
        self.on_hold.store(true, Ordering::SeqCst);
    }

    /// Undo [`hold`](Scheduler::hold). Idempotent.
    pub fn resume(&self) {
        self.on_hold.store(false, Ordering::SeqCst);
    }

    /// Cancel every task present now, effective at the next safe point.
    ///
    /// Called from inside an action, the mass removal covers every task
    /// that existed when the current tick began and spares tasks queued
    /// during the tick, including by the calling action itself.
    pub fn stop(&self) {
        self.will_stop.store(true, Ordering::SeqCst);
        if !self.in_loop.load(Ordering::SeqCst) {
            let mut inner = self.inner.lock();
            let inner = &mut *inner;
            for pid in inner.store.pids() {
                inner.ledger.mark(pid);
            }
        }
        log::debug!("stop requested");
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Number of stored tasks.
    pub fn task_count(&self) -> usize {
        self.inner.lock().store.len()
    }

    /// Event counters plus the live task count.
    pub fn stats(&self) -> SchedulerStats {
        self.metrics.snapshot(self.task_count())
    }

    /// Milliseconds until the earliest pending deadline, capped at
    /// [`MAX_WAIT_MS`].
    ///
    /// Returns 0 when some task is past due or still needs activation (the
    /// driver should tick immediately), and [`MAX_WAIT_MS`] when no tasks
    /// are stored.
    pub fn time_to_next_task(&self) -> u32 {
        let inner = self.inner.lock();
        if inner.store.is_empty() {
            return MAX_WAIT_MS;
        }
        let now = self.clock.now_ms();
        let mut next = MAX_WAIT_MS;
        for task in inner.store.iter() {
            match task.execute_at {
                None => return 0,
                Some(at) => {
                    let remaining = millis_until(at, now);
                    if remaining == 0 {
                        return 0;
                    }
                    next = next.min(remaining);
                }
            }
        }
        next
    }

    // -------------------------------------------------------------------
    // Engine step
    // -------------------------------------------------------------------

    /// One engine step. Runs to completion without blocking.
    ///
    /// Dispatches every ready task (parallel) or advances the head task
    /// (sequential), then commits deferred removals. Must be called
    /// repeatedly by the driver; [`time_to_next_task`](Scheduler::time_to_next_task)
    /// tells the driver how long it may sleep in between.
    pub fn tick(&self) {
        if self.on_hold.load(Ordering::SeqCst) {
            return;
        }

        let snapshot;
        {
            let mut inner = self.inner.lock();
            let inner = &mut *inner;
            if inner.store.is_empty() {
                return;
            }
            if self.will_stop.swap(false, Ordering::SeqCst) {
                inner.ledger.apply(&mut inner.store);
                // Tasks queued after the stop request are cancelled too.
                inner.store.clear();
                return;
            }
            if !inner.ledger.is_empty() {
                inner.ledger.apply(&mut inner.store);
            }
            snapshot = inner.store.pids();
        }

        let _guard = LoopGuard::enter(&self.in_loop);
        self.metrics.record_tick();
        let now = self.clock.now_ms();

        if self.is_sequential_mode() {
            self.tick_sequential(now, &snapshot);
        } else {
            self.tick_parallel(now, &snapshot);
        }
    }
}
