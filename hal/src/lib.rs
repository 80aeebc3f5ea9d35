//! # Tempo HAL - Clock Abstraction Layer
//!
//! This crate defines the timing abstraction the scheduler core consumes.
//! Target-specific tick sources implement the [`Clock`] trait; the scheduler
//! never touches hardware directly.
//!
//! ## Design Philosophy
//!
//! The HAL is designed to be:
//! - **Minimal**: Only exposes what the engine needs: a monotonic
//!   millisecond tick and the arithmetic to compare ticks safely.
//! - **Wrap-tolerant**: All tick comparisons go through the helpers in
//!   [`clock`], which remain correct across the 32-bit wrap (~49.7 days).
//! - **Testable**: [`stubs::StubClock`] provides a manually driven source
//!   for deterministic host-side tests.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod clock;

// Stub implementations (for hosts and tests)
pub mod stubs;

pub use clock::Clock;
