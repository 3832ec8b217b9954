//! Per-type conversions between native Rust values and [`TaggedValue`].
//!
//! Each supported native type implements [`NativeValueConverter`], which
//! fixes the tag it travels under and provides the two directions. Decoding
//! consumes the tagged value, so owned payloads are released exactly once.

use crate::{BridgeError, BridgeResult, NativeString, PointerKind, Tag, TaggedValue};
use std::ffi::c_void;

/// Conversion of a native type to and from its tagged representation.
///
/// Decoding a value whose tag differs from [`NativeValueConverter::TAG`]
/// fails with [`BridgeError::TagMismatch`]; the offending value is released.
pub trait NativeValueConverter: Sized {
    /// Tag this type travels under.
    const TAG: Tag;

    /// Moves `self` into a tagged value.
    fn encode(self) -> BridgeResult<TaggedValue>;

    /// Takes a native value out of a tagged value.
    fn decode(value: TaggedValue) -> BridgeResult<Self>;
}

/// Encodes any convertible native value.
pub fn encode<T: NativeValueConverter>(value: T) -> BridgeResult<TaggedValue> {
    value.encode()
}

/// Decodes a tagged value as `T`, releasing it when the tag does not match.
pub fn decode<T: NativeValueConverter>(value: TaggedValue) -> BridgeResult<T> {
    match value.expect_tag(T::TAG) {
        Ok(()) => T::decode(value),
        Err(error) => {
            value.free();
            Err(error)
        }
    }
}

/// The null marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null;

/// UTF-16 text that may hold unpaired surrogates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Utf16String(pub Vec<u16>);

/// An opaque pointer with the kind of resource it denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativePointer {
    /// Address of the resource
    pub pointer: *const c_void,
    /// What the address denotes
    pub kind: PointerKind,
}

/// Address of a synchronous native-function record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionRef(pub *const c_void);

/// Address of an asynchronous native-function record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncFunctionRef(pub *const c_void);

impl NativeValueConverter for Null {
    const TAG: Tag = Tag::Null;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::null())
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        value.expect_tag(Tag::Null)?;
        Ok(Null)
    }
}

impl NativeValueConverter for bool {
    const TAG: Tag = Tag::Bool;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_bool(self))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        value.into_bool()
    }
}

impl NativeValueConverter for i64 {
    const TAG: Tag = Tag::Int;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_i64(self))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        value.into_i64()
    }
}

impl NativeValueConverter for i32 {
    const TAG: Tag = Tag::Int;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_i64(i64::from(self)))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        let wide = value.into_i64()?;
        i32::try_from(wide).map_err(|_| BridgeError::IntegerOutOfRange(wide))
    }
}

impl NativeValueConverter for f64 {
    const TAG: Tag = Tag::Float64;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_f64(self))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        value.into_f64()
    }
}

impl NativeValueConverter for NativeString {
    const TAG: Tag = Tag::String;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_string(self))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        value.into_string()
    }
}

impl NativeValueConverter for String {
    const TAG: Tag = Tag::String;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_string(NativeString::from_utf8(&self)?))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        value.into_string()?.to_rust_string()
    }
}

impl NativeValueConverter for Utf16String {
    const TAG: Tag = Tag::String;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_string(NativeString::from_utf16(&self.0)?))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        Ok(Utf16String(value.into_string()?.as_utf16().to_vec()))
    }
}

impl NativeValueConverter for serde_json::Value {
    const TAG: Tag = Tag::Json;

    fn encode(self) -> BridgeResult<TaggedValue> {
        let text = serde_json::to_string(&self).map_err(|e| BridgeError::Json(e.to_string()))?;
        Ok(TaggedValue::from_json_text(text))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        let text = value.into_json_text()?;
        serde_json::from_str(&text).map_err(|e| BridgeError::Json(e.to_string()))
    }
}

impl<T: NativeValueConverter> NativeValueConverter for Vec<T> {
    const TAG: Tag = Tag::List;

    fn encode(self) -> BridgeResult<TaggedValue> {
        let mut items = Vec::with_capacity(self.len());
        for element in self {
            match element.encode() {
                Ok(item) => items.push(item),
                Err(error) => {
                    TaggedValue::from_list(items).free();
                    return Err(error);
                }
            }
        }
        Ok(TaggedValue::from_list(items))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        let mut items = value.into_list()?.into_iter();
        let mut decoded = Vec::with_capacity(items.len());
        while let Some(item) = items.next() {
            match decode::<T>(item) {
                Ok(element) => decoded.push(element),
                Err(error) => {
                    // The remaining elements are still owned here.
                    items.for_each(TaggedValue::free);
                    return Err(error);
                }
            }
        }
        Ok(decoded)
    }
}

impl NativeValueConverter for NativePointer {
    const TAG: Tag = Tag::Pointer;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_pointer(self.pointer, self.kind))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        let (pointer, kind) = value.into_pointer()?;
        Ok(NativePointer { pointer, kind })
    }
}

impl NativeValueConverter for FunctionRef {
    const TAG: Tag = Tag::Function;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_function(self.0))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        value.into_function().map(FunctionRef)
    }
}

impl NativeValueConverter for AsyncFunctionRef {
    const TAG: Tag = Tag::AsyncFunction;

    fn encode(self) -> BridgeResult<TaggedValue> {
        Ok(TaggedValue::from_async_function(self.0))
    }

    fn decode(value: TaggedValue) -> BridgeResult<Self> {
        value.into_async_function().map(AsyncFunctionRef)
    }
}
