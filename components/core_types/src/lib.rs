//! Core script value types and error handling.
//!
//! This crate provides the foundational types shared by every layer of the
//! bridge: the engine-neutral script value model, object handles, and the
//! script-level error surface.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of script values
//! - [`JsString`] - UTF-16 string with explicit length
//! - [`ObjectId`] - Generational handle to an object in a context heap
//! - [`JsError`] - Script-level error
//! - [`ErrorKind`] - Types of script errors
//! - [`ExceptionState`] - Output parameter carrying at most one pending error
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, ExceptionState, Value};
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! let mut exception_state = ExceptionState::new();
//! exception_state.throw_exception(ErrorKind::TypeError, "not an object");
//! assert!(exception_state.has_exception());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod exception_state;
mod handle;
mod value;

pub use error::{ErrorKind, JsError};
pub use exception_state::ExceptionState;
pub use handle::ObjectId;
pub use value::{array_index, JsString, Value};
