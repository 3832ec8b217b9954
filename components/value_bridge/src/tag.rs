//! Stable discriminants shared with the host runtime.
//!
//! The numbering is part of the wire contract: values are never renumbered,
//! new kinds are only appended.

use crate::BridgeError;

/// Selects the active interpretation of a [`crate::TaggedValue`] payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Tag {
    /// Owned [`crate::NativeString`]
    String = 0,
    /// Signed 64-bit integer
    Int = 1,
    /// Boolean (payload 0 or 1)
    Bool = 2,
    /// Null
    Null = 3,
    /// IEEE-754 double stored as its bit pattern
    Float64 = 4,
    /// Owned UTF-8 JSON text, length in `aux`
    Json = 5,
    /// Owned array of tagged values, length in `aux`
    List = 6,
    /// Opaque pointer, [`PointerKind`] in `aux`
    Pointer = 7,
    /// Synchronous native-function reference
    Function = 8,
    /// Asynchronous native-function reference
    AsyncFunction = 9,
}

impl TryFrom<i32> for Tag {
    type Error = BridgeError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => Tag::String,
            1 => Tag::Int,
            2 => Tag::Bool,
            3 => Tag::Null,
            4 => Tag::Float64,
            5 => Tag::Json,
            6 => Tag::List,
            7 => Tag::Pointer,
            8 => Tag::Function,
            9 => Tag::AsyncFunction,
            other => return Err(BridgeError::UnknownTag(other)),
        })
    }
}

/// Identifies which native resource a pointer-tagged value denotes.
///
/// The kind selects the decode path only; ownership transfer is a separate,
/// per-call contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum PointerKind {
    /// Context of a pending asynchronous host call
    AsyncContext = 0,
    /// Record of a native-function reference
    NativeFunctionContext = 1,
    /// Layout bounding rectangle
    BoundingRect = 2,
    /// 2D drawing context
    RenderingContext2d = 3,
    /// Any other bindable object
    BindingObject = 4,
}

impl TryFrom<i64> for PointerKind {
    type Error = BridgeError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => PointerKind::AsyncContext,
            1 => PointerKind::NativeFunctionContext,
            2 => PointerKind::BoundingRect,
            3 => PointerKind::RenderingContext2d,
            4 => PointerKind::BindingObject,
            other => return Err(BridgeError::UnknownPointerKind(other)),
        })
    }
}
