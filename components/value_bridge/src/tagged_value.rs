//! The fixed-layout wire record.

use crate::{BridgeError, BridgeResult, NativeString, PointerKind, Tag};
use std::ffi::c_void;
use std::ptr;

/// Discriminated value exchanged with the host runtime.
///
/// Layout: `{tag: i32, aux: i64, payload: u64}`. The payload is a single
/// 64-bit field whose meaning is selected by `tag`:
///
/// | tag              | payload                          | aux            |
/// |------------------|----------------------------------|----------------|
/// | `String`         | `*mut NativeString`              | 0              |
/// | `Int`            | `i64` bits                       | 0              |
/// | `Bool`           | 0 or 1                           | 0              |
/// | `Null`           | 0                                | 0              |
/// | `Float64`        | `f64::to_bits`                   | 0              |
/// | `Json`           | `*mut u8` UTF-8 text             | byte length    |
/// | `List`           | `*mut TaggedValue` array         | element count  |
/// | `Pointer`        | address                          | `PointerKind`  |
/// | `Function`       | function-record address          | 0              |
/// | `AsyncFunction`  | function-record address          | 0              |
///
/// The record has no destructor. Owned payloads are released by the `into_*`
/// accessors that take them or by [`TaggedValue::free`].
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub struct TaggedValue {
    tag: i32,
    aux: i64,
    payload: u64,
}

impl TaggedValue {
    /// The null value.
    pub const fn null() -> Self {
        Self {
            tag: Tag::Null as i32,
            aux: 0,
            payload: 0,
        }
    }

    /// Encodes a boolean.
    pub const fn from_bool(value: bool) -> Self {
        Self {
            tag: Tag::Bool as i32,
            aux: 0,
            payload: value as u64,
        }
    }

    /// Encodes a signed 64-bit integer.
    pub const fn from_i64(value: i64) -> Self {
        Self {
            tag: Tag::Int as i32,
            aux: 0,
            payload: value as u64,
        }
    }

    /// Encodes a double, bit-exact (NaN payloads and the sign of zero survive).
    pub fn from_f64(value: f64) -> Self {
        Self {
            tag: Tag::Float64 as i32,
            aux: 0,
            payload: value.to_bits(),
        }
    }

    /// Moves a string into the value.
    pub fn from_string(value: NativeString) -> Self {
        Self {
            tag: Tag::String as i32,
            aux: 0,
            payload: value.into_raw() as usize as u64,
        }
    }

    /// Moves serialized JSON text into the value.
    pub fn from_json_text(text: String) -> Self {
        let bytes = text.into_bytes().into_boxed_slice();
        let length = bytes.len() as i64;
        Self {
            tag: Tag::Json as i32,
            aux: length,
            payload: Box::into_raw(bytes) as *mut u8 as usize as u64,
        }
    }

    /// Moves a list of values (homogeneous or not) into the value.
    pub fn from_list(values: Vec<TaggedValue>) -> Self {
        let items = values.into_boxed_slice();
        let length = items.len() as i64;
        Self {
            tag: Tag::List as i32,
            aux: length,
            payload: Box::into_raw(items) as *mut TaggedValue as usize as u64,
        }
    }

    /// Encodes an opaque pointer with the kind of resource it denotes.
    pub fn from_pointer(pointer: *const c_void, kind: PointerKind) -> Self {
        Self {
            tag: Tag::Pointer as i32,
            aux: kind as i64,
            payload: pointer as usize as u64,
        }
    }

    /// Encodes a synchronous native-function reference.
    pub fn from_function(record: *const c_void) -> Self {
        Self {
            tag: Tag::Function as i32,
            aux: 0,
            payload: record as usize as u64,
        }
    }

    /// Encodes an asynchronous native-function reference.
    pub fn from_async_function(record: *const c_void) -> Self {
        Self {
            tag: Tag::AsyncFunction as i32,
            aux: 0,
            payload: record as usize as u64,
        }
    }

    /// Rebuilds a value received from the host.
    ///
    /// # Safety
    ///
    /// For owned tags (`String`, `Json`, `List`) the payload must have been
    /// produced by this crate's constructors and not yet released.
    pub unsafe fn from_raw_parts(tag: i32, aux: i64, payload: u64) -> Self {
        Self { tag, aux, payload }
    }

    /// Splits the value into its wire fields, transferring ownership of any
    /// payload to the caller.
    pub fn into_raw_parts(self) -> (i32, i64, u64) {
        (self.tag, self.aux, self.payload)
    }

    /// The tag, validated against the stable numbering.
    pub fn tag(&self) -> BridgeResult<Tag> {
        Tag::try_from(self.tag)
    }

    /// The raw tag field.
    pub fn raw_tag(&self) -> i32 {
        self.tag
    }

    /// The auxiliary field.
    pub fn aux(&self) -> i64 {
        self.aux
    }

    /// The pointer kind of a `Pointer` value.
    pub fn pointer_kind(&self) -> BridgeResult<PointerKind> {
        self.expect_tag(Tag::Pointer)?;
        PointerKind::try_from(self.aux)
    }

    /// Fails unless the value carries `expected`.
    pub fn expect_tag(&self, expected: Tag) -> BridgeResult<()> {
        let found = self.tag()?;
        if found == expected {
            Ok(())
        } else {
            Err(BridgeError::TagMismatch { expected, found })
        }
    }

    /// Decodes a boolean.
    pub fn into_bool(self) -> BridgeResult<bool> {
        self.expect_tag(Tag::Bool)?;
        Ok(self.payload != 0)
    }

    /// Decodes a signed 64-bit integer.
    pub fn into_i64(self) -> BridgeResult<i64> {
        self.expect_tag(Tag::Int)?;
        Ok(self.payload as i64)
    }

    /// Decodes a double.
    pub fn into_f64(self) -> BridgeResult<f64> {
        self.expect_tag(Tag::Float64)?;
        Ok(f64::from_bits(self.payload))
    }

    /// Takes the string out of the value.
    pub fn into_string(self) -> BridgeResult<NativeString> {
        self.expect_tag(Tag::String)?;
        let raw = self.payload as usize as *mut NativeString;
        if raw.is_null() {
            return Err(BridgeError::NullPointer(Tag::String));
        }
        // SAFETY: `String` payloads are only created by `from_string` (or
        // `from_raw_parts`, whose caller vouches for them) and `self` is
        // consumed, so the record is taken exactly once.
        Ok(unsafe { NativeString::from_raw(raw) })
    }

    /// Takes the JSON text out of the value.
    pub fn into_json_text(self) -> BridgeResult<String> {
        self.expect_tag(Tag::Json)?;
        let bytes = self.take_json_bytes()?;
        String::from_utf8(bytes.into_vec()).map_err(|e| BridgeError::Json(e.to_string()))
    }

    /// Takes the list out of the value.
    pub fn into_list(self) -> BridgeResult<Vec<TaggedValue>> {
        self.expect_tag(Tag::List)?;
        Ok(self.take_list_items()?.into_vec())
    }

    /// Takes the list out of the value, rejecting lists longer than `max`.
    ///
    /// A rejected list is released before the error is returned.
    pub fn into_list_with_limit(self, max: usize) -> BridgeResult<Vec<TaggedValue>> {
        self.expect_tag(Tag::List)?;
        let got = self.aux.max(0) as usize;
        if got > max {
            self.free();
            return Err(BridgeError::LimitExceeded {
                what: "list",
                got,
                max,
            });
        }
        self.into_list()
    }

    /// Decodes a pointer and its kind.
    pub fn into_pointer(self) -> BridgeResult<(*const c_void, PointerKind)> {
        let kind = self.pointer_kind()?;
        Ok((self.payload as usize as *const c_void, kind))
    }

    /// Decodes a synchronous function-record address.
    pub fn into_function(self) -> BridgeResult<*const c_void> {
        self.expect_tag(Tag::Function)?;
        Ok(self.payload as usize as *const c_void)
    }

    /// Decodes an asynchronous function-record address.
    pub fn into_async_function(self) -> BridgeResult<*const c_void> {
        self.expect_tag(Tag::AsyncFunction)?;
        Ok(self.payload as usize as *const c_void)
    }

    /// Releases any owned payload. Lists release their elements recursively.
    pub fn free(self) {
        match self.tag() {
            Ok(Tag::String) => {
                let _ = self.into_string();
            }
            Ok(Tag::Json) => {
                let _ = self.take_json_bytes();
            }
            Ok(Tag::List) => {
                if let Ok(items) = self.take_list_items() {
                    for item in items.into_vec() {
                        item.free();
                    }
                }
            }
            Ok(_) => {}
            Err(error) => {
                // Nothing is known about the payload of an unknown tag.
                log::warn!("leaking payload of tagged value: {}", error);
            }
        }
    }

    fn take_json_bytes(&self) -> BridgeResult<Box<[u8]>> {
        let data = self.payload as usize as *mut u8;
        if data.is_null() {
            return Err(BridgeError::NullPointer(Tag::Json));
        }
        let slice = ptr::slice_from_raw_parts_mut(data, self.aux.max(0) as usize);
        // SAFETY: `Json` payloads are boxed byte slices of length `aux` created
        // by `from_json_text`; callers consume `self` right after.
        Ok(unsafe { Box::from_raw(slice) })
    }

    fn take_list_items(&self) -> BridgeResult<Box<[TaggedValue]>> {
        let data = self.payload as usize as *mut TaggedValue;
        if data.is_null() {
            return Err(BridgeError::NullPointer(Tag::List));
        }
        let slice = ptr::slice_from_raw_parts_mut(data, self.aux.max(0) as usize);
        // SAFETY: `List` payloads are boxed slices of length `aux` created by
        // `from_list`; callers consume `self` right after.
        Ok(unsafe { Box::from_raw(slice) })
    }
}

impl Default for TaggedValue {
    fn default() -> Self {
        Self::null()
    }
}
