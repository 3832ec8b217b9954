//! Value exchange with the host runtime.
//!
//! Everything that crosses the foreign-function boundary between the bridge
//! and the host runtime travels as a [`TaggedValue`]: a `#[repr(C)]` record
//! holding a [`Tag`], a 64-bit auxiliary integer and a 64-bit payload.
//!
//! # Overview
//!
//! - [`TaggedValue`] - the wire record and its typed constructors/accessors
//! - [`Tag`] / [`PointerKind`] - stable discriminants shared with the host
//! - [`NativeString`] - owned UTF-16 buffer with explicit length
//! - [`NativeValueConverter`] - `encode`/`decode` for each supported native type
//!
//! Owned payloads (strings, JSON text, lists) are released exactly once, either
//! by decoding the value or by [`TaggedValue::free`]. The Rust type is neither
//! `Clone` nor `Copy` so a payload cannot be consumed twice.
//!
//! # Examples
//!
//! ```
//! use value_bridge::{decode, encode, Tag};
//!
//! let value = encode(String::from("héllo\0world")).unwrap();
//! assert_eq!(value.tag().unwrap(), Tag::String);
//! let back: String = decode(value).unwrap();
//! assert_eq!(back, "héllo\0world");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod converter;
mod error;
pub mod ffi;
mod native_string;
mod tag;
mod tagged_value;

pub use converter::{
    decode, encode, AsyncFunctionRef, FunctionRef, NativePointer, NativeValueConverter, Null,
    Utf16String,
};
pub use error::{BridgeError, BridgeResult};
pub use native_string::NativeString;
pub use tag::{PointerKind, Tag};
pub use tagged_value::TaggedValue;
