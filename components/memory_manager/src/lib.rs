//! Memory Manager - traced object heap for a script context
//!
//! This component provides:
//! - The [`Trace`] contract every script-reachable native object implements
//! - A generational-index [`Heap`] with tri-color mark and sweep
//! - Counted keep-alive holds for objects handed across the host boundary
//!
//! The heap never runs on its own: the owning context decides when a
//! collection happens and supplies its root set.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod gc;
pub mod heap;

pub use gc::{MarkColor, Trace, Visitor};
pub use heap::{AliveStatus, GcStats, Heap};
