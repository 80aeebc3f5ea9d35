//! # Task Store
//!
//! Bounded, insertion-ordered container for live tasks. Every access
//! happens under the scheduler's critical section; the store itself does
//! no locking.

use alloc::vec::Vec;

use crate::config::MAX_TASKS;
use crate::task::Task;
use crate::{Pid, SchedError, SchedResult};

/// Insertion-ordered task container, bounded at [`MAX_TASKS`].
pub(crate) struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub(crate) const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append a task, rejecting at capacity.
    pub(crate) fn push(&mut self, task: Task) -> SchedResult<()> {
        if self.tasks.len() >= MAX_TASKS {
            return Err(SchedError::CapacityExceeded);
        }
        self.tasks.push(task);
        Ok(())
    }

    pub(crate) fn contains(&self, pid: Pid) -> bool {
        self.tasks.iter().any(|task| task.pid == pid)
    }

    pub(crate) fn get_mut(&mut self, pid: Pid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.pid == pid)
    }

    /// Remove and return the task with the given PID, preserving the order
    /// of the remaining tasks.
    pub(crate) fn erase(&mut self, pid: Pid) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.pid == pid)?;
        Some(self.tasks.remove(index))
    }

    /// The oldest stored task (sequential-mode head).
    pub(crate) fn front_mut(&mut self) -> Option<&mut Task> {
        self.tasks.first_mut()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn clear(&mut self) {
        self.tasks.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut()
    }

    /// PIDs of every stored task, in insertion order.
    pub(crate) fn pids(&self) -> Vec<Pid> {
        self.tasks.iter().map(|task| task.pid).collect()
    }
}
