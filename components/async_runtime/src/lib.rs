//! Async runtime for a script context.
//!
//! This crate provides the cooperative scheduling piece of the bridge: the
//! per-context microtask queue that promise reactions and asynchronous native
//! calls are scheduled on.
//!
//! # Overview
//!
//! - [`Microtask`] - a queued callback and its captured data
//! - [`MicrotaskQueue`] - FIFO queue with a re-entrant drain loop
//!
//! There is no preemption and no blocking I/O: control returns to the caller
//! of [`MicrotaskQueue::drain`] only when the queue is empty.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod microtask;

pub use microtask::{Microtask, MicrotaskQueue};
