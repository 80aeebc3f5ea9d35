//! # Scheduler Configuration
//!
//! Compile-time tunables for the scheduler core.

use static_assertions::const_assert;

/// Maximum number of concurrently stored tasks.
pub const MAX_TASKS: usize = 124;

/// Upper bound, in milliseconds, on the value reported by
/// [`Scheduler::time_to_next_task`](crate::Scheduler::time_to_next_task).
pub const MAX_WAIT_MS: u32 = 60_000;

// Every stored task needs a distinct nonzero u16 PID.
const_assert!(MAX_TASKS < u16::MAX as usize);

// Tick comparisons are signed; reported waits must stay below the 2^31 ms
// horizon.
const_assert!(MAX_WAIT_MS < (1 << 31));
