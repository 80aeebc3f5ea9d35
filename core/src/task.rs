//! # Task Record
//!
//! The unit of deferred work: an erased action, an optional gating
//! predicate, and two orthogonal delays: the condition deadline and the
//! post-condition delay.

use alloc::boxed::Box;

use crate::Pid;

/// Erased task body. Invoked with the scheduler lock released.
pub type TaskAction = Box<dyn FnMut() + Send>;

/// Erased gating predicate. Evaluated under the scheduler lock; must be
/// short and must not call back into the scheduler.
pub type TaskPredicate = Box<dyn FnMut() -> bool + Send>;

/// Erased condition-timeout handler. Receives the PID of the expired task;
/// invoked with the scheduler lock released.
pub type TimeoutHandler = Box<dyn FnMut(Pid) + Send>;

/// How long a task may wait for its predicate to become true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Wait forever: the task lives until its predicate holds or it is
    /// removed.
    Indefinite,
    /// The predicate must hold within this many milliseconds of activation,
    /// or the task is removed (firing its timeout handler, if any).
    Finite(u32),
}

impl Wait {
    /// The public API encodes "indefinite" as a zero wait.
    pub(crate) fn from_millis(wait_ms: u32) -> Self {
        if wait_ms == 0 {
            Wait::Indefinite
        } else {
            Wait::Finite(wait_ms)
        }
    }
}

/// A stored unit of deferred work.
pub(crate) struct Task {
    /// Identifier, unique within the live set.
    pub pid: Pid,
    /// Body. `None` only while the body is being dispatched.
    pub action: Option<TaskAction>,
    /// Gating predicate. `None` is equivalent to always-true.
    pub predicate: Option<TaskPredicate>,
    /// Invoked once if the condition deadline expires.
    pub on_timeout: Option<TimeoutHandler>,
    /// Re-arm after each dispatch (parallel mode only).
    pub repeat: bool,
    /// Delay between repeat dispatches, milliseconds.
    pub interval_ms: u32,
    /// How long the predicate may stay unmet after activation.
    pub condition_wait: Wait,
    /// Delay between predicate truth and dispatch, milliseconds.
    pub post_delay_ms: u32,
    /// Whether the predicate has been observed true in the current phase.
    pub condition_met: bool,
    /// Pending deadline: the dispatch tick once the condition is met, the
    /// condition deadline before that. `None` until the task is activated
    /// for its current phase.
    pub execute_at: Option<u32>,
}

impl Task {
    /// Evaluate the gating predicate; absence is always-true.
    pub(crate) fn condition_holds(&mut self) -> bool {
        match self.predicate.as_mut() {
            Some(predicate) => predicate(),
            None => true,
        }
    }

    /// Return the task to a fresh pending phase after a repeat dispatch.
    pub(crate) fn reset_for_repeat(&mut self) {
        self.condition_met = false;
        self.post_delay_ms = self.interval_ms;
        self.execute_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_from_millis_maps_zero_to_indefinite() {
        assert_eq!(Wait::from_millis(0), Wait::Indefinite);
        assert_eq!(Wait::from_millis(1), Wait::Finite(1));
        assert_eq!(Wait::from_millis(60_000), Wait::Finite(60_000));
    }
}
